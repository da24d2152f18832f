//! Board projection sent to agents.
//!
//! Shape:
//! `{game:{id,timeout}, turn, board:{height,width,food,hazards,snakes}, you}`
//! where `you` repeats the receiving agent's entry from `board.snakes`.

use serde::{Deserialize, Serialize};

/// A board cell. `(0, 0)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Game metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: String,
    /// Per-request timeout in milliseconds.
    pub timeout: u32,
}

/// Public state of one agent's snake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeView {
    pub id: String,
    pub name: String,
    pub health: i32,
    pub body: Vec<Coord>,
    /// Last measured response time in milliseconds, as a string.
    pub latency: String,
    pub head: Coord,
    pub length: u32,
    pub shout: String,
    pub squad: String,
}

/// Full board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub height: u32,
    pub width: u32,
    pub food: Vec<Coord>,
    pub hazards: Vec<Coord>,
    pub snakes: Vec<SnakeView>,
}

/// Request body for `/start`, `/move` and `/end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub game: GameInfo,
    pub turn: u32,
    pub board: BoardView,
    pub you: SnakeView,
}

impl Projection {
    /// The `board.snakes` entry that `you` refers to, if any.
    pub fn you_on_board(&self) -> Option<&SnakeView> {
        self.board.snakes.iter().find(|s| s.id == self.you.id)
    }
}
