//! Arena wire protocol.
//!
//! JSON shapes exchanged between the game runner and remote agents:
//! - [`Projection`]: board view POSTed to `/start`, `/move` and `/end`
//! - [`MoveReply`]: body returned by `/move`
//! - [`PingReply`]: body returned by the capability probe (`GET /`)
//!
//! Field names are fixed by the agent contract and must not change.

pub mod direction;
pub mod reply;
pub mod wire;

pub use direction::{Direction, ParseDirectionError};
pub use reply::{MoveReply, PingReply};
pub use wire::{BoardView, Coord, GameInfo, Projection, SnakeView};

/// Maximum number of characters of a shout that is echoed back to agents.
pub const MAX_SHOUT_LEN: usize = 256;
