//! Core game entities.
//!
//! - [`BoardState`]: authoritative snapshot of the board for one turn
//! - [`Move`]: one agent's command for one turn
//! - [`TurnContext`]: what a single turn works with
//! - [`GameResult`]: the outcome handed back when the loop ends

use serde::{Deserialize, Serialize};

pub use arena_proto::{Coord, Direction};

/// Identifier of an agent, unique within a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl From<uuid::Uuid> for AgentId {
    fn from(id: uuid::Uuid) -> Self {
        AgentId(id.to_string())
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ruleset variant selector.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    #[default]
    Standard,
    Royale,
    Squad,
    Solo,
    Constrictor,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Standard => "standard",
            GameType::Royale => "royale",
            GameType::Squad => "squad",
            GameType::Solo => "solo",
            GameType::Constrictor => "constrictor",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a snake left the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EliminationCause {
    Collision,
    SelfCollision,
    HeadToHead,
    OutOfBounds,
    OutOfHealth,
    Hazard,
    BySquad,
    Other(String),
}

/// Elimination record. Set once by the ruleset, never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub cause: EliminationCause,
    /// Turn on which the snake was eliminated.
    pub turn: u32,
    /// Agent responsible, when there is one.
    pub by: Option<AgentId>,
}

/// Per-agent record on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeState {
    pub id: AgentId,
    /// Head first.
    pub body: Vec<Coord>,
    pub health: i32,
    pub eliminated: Option<Elimination>,
}

impl SnakeState {
    pub fn new(id: AgentId, body: Vec<Coord>, health: i32) -> Self {
        Self {
            id,
            body,
            health,
            eliminated: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.eliminated.is_none()
    }

    pub fn head(&self) -> Option<Coord> {
        self.body.first().copied()
    }
}

/// Authoritative board snapshot.
///
/// `turn` is the version: 0 for the initial board, `n` after `n` turns were
/// applied. A new value is produced every turn; old snapshots are never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub turn: u32,
    pub width: u32,
    pub height: u32,
    pub food: Vec<Coord>,
    pub hazards: Vec<Coord>,
    pub snakes: Vec<SnakeState>,
}

impl BoardState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            turn: 0,
            width,
            height,
            food: Vec::new(),
            hazards: Vec::new(),
            snakes: Vec::new(),
        }
    }

    pub fn snake(&self, id: &AgentId) -> Option<&SnakeState> {
        self.snakes.iter().find(|s| &s.id == id)
    }

    pub fn live_snakes(&self) -> impl Iterator<Item = &SnakeState> {
        self.snakes.iter().filter(|s| s.is_alive())
    }

    pub fn is_alive(&self, id: &AgentId) -> bool {
        self.snake(id).map(SnakeState::is_alive).unwrap_or(false)
    }

    pub fn contains(&self, point: Coord) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.width
            && (point.y as u32) < self.height
    }
}

/// One agent's command for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub agent_id: AgentId,
    pub direction: Direction,
    pub shout: Option<String>,
}

impl Move {
    pub fn new(agent_id: AgentId, direction: Direction) -> Self {
        Self {
            agent_id,
            direction,
            shout: None,
        }
    }
}

/// Everything a single turn works with. Dropped when the turn ends.
#[derive(Debug)]
pub struct TurnContext<'a> {
    /// Turn being played (1 for the first turn).
    pub turn: u32,
    /// Board as it was before this turn's moves.
    pub state: &'a BoardState,
    pub moves: Vec<Move>,
}

impl<'a> TurnContext<'a> {
    pub fn new(turn: u32, state: &'a BoardState) -> Self {
        Self {
            turn,
            state,
            moves: Vec::new(),
        }
    }
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Solo games only report completion.
    SoloCompleted,
    Draw,
    Winner { agent_id: AgentId, name: String },
    /// Every survivor belongs to `squad`. `name` is the last survivor's name.
    SquadWinner {
        squad: String,
        agent_ids: Vec<AgentId>,
        name: String,
    },
}

/// Final result of a game. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: String,
    pub turn: u32,
    /// Winning agent's name, empty for a draw or a solo game.
    pub winner: String,
    pub outcome: Outcome,
    pub board: BoardState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardState {
        let mut state = BoardState::new(5, 5);
        state.snakes.push(SnakeState::new(
            AgentId::from("a"),
            vec![Coord::new(1, 1)],
            100,
        ));
        let mut dead = SnakeState::new(AgentId::from("b"), vec![Coord::new(3, 3)], 0);
        dead.eliminated = Some(Elimination {
            cause: EliminationCause::OutOfHealth,
            turn: 4,
            by: None,
        });
        state.snakes.push(dead);
        state
    }

    #[test]
    fn test_live_snakes_skip_eliminated() {
        let state = board();
        let live: Vec<_> = state.live_snakes().map(|s| s.id.clone()).collect();
        assert_eq!(live, vec![AgentId::from("a")]);
        assert!(state.is_alive(&AgentId::from("a")));
        assert!(!state.is_alive(&AgentId::from("b")));
        assert!(!state.is_alive(&AgentId::from("missing")));
    }

    #[test]
    fn test_contains_respects_bounds() {
        let state = board();
        assert!(state.contains(Coord::new(0, 0)));
        assert!(state.contains(Coord::new(4, 4)));
        assert!(!state.contains(Coord::new(5, 0)));
        assert!(!state.contains(Coord::new(0, -1)));
    }

    #[test]
    fn test_game_type_serializes_lowercase() {
        let json = serde_json::to_string(&GameType::Constrictor).unwrap();
        assert_eq!(json, "\"constrictor\"");
        let parsed: GameType = serde_json::from_str("\"solo\"").unwrap();
        assert_eq!(parsed, GameType::Solo);
    }
}
