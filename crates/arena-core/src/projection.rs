//! Per-agent board views.
//!
//! Every agent sees the whole board; the only per-agent part is `you`, a copy
//! of the receiver's own entry from `board.snakes`. A projection is built from
//! the board as it stood before the current turn's moves are applied.

use arena_proto::{BoardView, GameInfo, Projection, SnakeView};

use crate::agent::AgentRegistry;
use crate::error::ProjectionError;
use crate::model::{AgentId, BoardState, SnakeState};

/// Builds the request body sent to each agent.
#[derive(Debug, Clone)]
pub struct StateProjector {
    game_id: String,
    timeout_ms: u32,
}

impl StateProjector {
    pub fn new(game_id: impl Into<String>, timeout_ms: u32) -> Self {
        Self {
            game_id: game_id.into(),
            timeout_ms,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Project `state` for `target`.
    ///
    /// Fails when the target is not on the board or any snake has an empty
    /// body; both mean the game's own state is inconsistent.
    pub fn project(
        &self,
        turn: u32,
        state: &BoardState,
        registry: &AgentRegistry,
        target: &AgentId,
    ) -> Result<Projection, ProjectionError> {
        let snakes = state
            .snakes
            .iter()
            .map(|snake| snake_view(snake, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let you = snakes
            .iter()
            .find(|view| view.id == target.as_str())
            .cloned()
            .ok_or_else(|| ProjectionError::UnknownAgent(target.clone()))?;

        Ok(Projection {
            game: GameInfo {
                id: self.game_id.clone(),
                timeout: self.timeout_ms,
            },
            turn,
            board: BoardView {
                height: state.height,
                width: state.width,
                food: state.food.clone(),
                hazards: state.hazards.clone(),
                snakes,
            },
            you,
        })
    }
}

fn snake_view(snake: &SnakeState, registry: &AgentRegistry) -> Result<SnakeView, ProjectionError> {
    let head = snake
        .head()
        .ok_or_else(|| ProjectionError::EmptyBody(snake.id.clone()))?;
    let agent = registry.get(&snake.id);

    Ok(SnakeView {
        id: snake.id.to_string(),
        name: registry.name_of(&snake.id),
        health: snake.health,
        body: snake.body.clone(),
        latency: agent
            .map(|a| a.latency_label())
            .unwrap_or_else(|| "0".to_string()),
        head,
        length: snake.body.len() as u32,
        shout: agent.map(|a| a.last_shout.clone()).unwrap_or_default(),
        squad: agent.map(|a| a.squad.clone()).unwrap_or_default(),
    })
}
