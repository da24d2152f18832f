//! Display capability.
//!
//! A [`Renderer`] receives one [`RenderFrame`] per turn when rendering is
//! enabled. Drawing is left entirely to the implementation.

use crate::model::{AgentId, BoardState, Coord, GameType};

/// Name and glyph of one agent, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLabel {
    pub id: AgentId,
    pub name: String,
    pub glyph: char,
}

/// Everything needed to draw one turn.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub turn: u32,
    pub seed: u64,
    pub game_type: GameType,
    pub board: &'a BoardState,
    pub hazards: &'a [Coord],
    pub agents: &'a [AgentLabel],
}

impl RenderFrame<'_> {
    pub fn label(&self, id: &AgentId) -> Option<&AgentLabel> {
        self.agents.iter().find(|a| &a.id == id)
    }
}

pub trait Renderer: Send {
    fn render(&mut self, frame: &RenderFrame<'_>);
}
