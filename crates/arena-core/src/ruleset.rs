//! Game mechanics capability.
//!
//! The engine never moves snakes, places food or decides eliminations itself.
//! It drives a [`Ruleset`] through three operations and treats any error from
//! it as fatal. Variants (royale, squad, solo, constrictor) share the same
//! contract; how they share health or grow hazards is their business.

use std::collections::BTreeMap;

use rand::rngs::StdRng;

use crate::error::RulesetError;
use crate::model::{AgentId, BoardState, GameType, Move};

/// Game mechanics driven by the loop.
pub trait Ruleset: Send {
    /// Build the initial board for the given agents.
    fn create_initial_state(
        &mut self,
        width: u32,
        height: u32,
        agent_ids: &[AgentId],
    ) -> Result<BoardState, RulesetError>;

    /// Whether `state` is terminal.
    fn is_game_over(&self, state: &BoardState) -> bool;

    /// Apply one move per live agent to `state`, producing the next board.
    ///
    /// `state` is borrowed; implementations must return a new value.
    fn create_next_state(
        &mut self,
        state: &BoardState,
        moves: &[Move],
    ) -> Result<BoardState, RulesetError>;
}

/// Inputs a ruleset is built from.
#[derive(Debug)]
pub struct RulesetSettings {
    pub game_type: GameType,
    pub seed: u64,
    /// Seeded random source; the only randomness the ruleset may use.
    pub rng: StdRng,
    /// Agent to squad label, populated in squad games.
    pub squads: BTreeMap<AgentId, String>,
}

/// Builds the ruleset for a game once agents are known.
pub trait RulesetFactory: Send + Sync {
    fn build(&self, settings: RulesetSettings) -> Result<Box<dyn Ruleset>, RulesetError>;
}

impl<F> RulesetFactory for F
where
    F: Fn(RulesetSettings) -> Result<Box<dyn Ruleset>, RulesetError> + Send + Sync,
{
    fn build(&self, settings: RulesetSettings) -> Result<Box<dyn Ruleset>, RulesetError> {
        self(settings)
    }
}
