//! Error taxonomy for the game runner.
//!
//! Two severities:
//! - [`TransportError`] is recoverable. Move requests absorb it through the
//!   fallback move; start/end notifications and probes only log it.
//! - [`GameError`] is fatal. The loop stops and hands it to the caller, which
//!   decides whether to exit the process.

use std::fmt;

use arena_proto::ParseDirectionError;

use crate::model::AgentId;

/// Failure talking to a remote agent.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} could not be decoded: {reason}")]
    Decode { url: String, reason: String },

    #[error("response from {url} named an unknown move: {source}")]
    UnknownMove {
        url: String,
        #[source]
        source: ParseDirectionError,
    },
}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors reported by a [`crate::ruleset::Ruleset`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesetError {
    #[error("ruleset could not be constructed: {0}")]
    Construction(String),

    #[error("board state rejected by ruleset: {0}")]
    InvalidState(String),
}

/// Internal inconsistency found while building an agent's board view.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("agent {0} is not on the board")]
    UnknownAgent(AgentId),

    #[error("agent {0} has an empty body")]
    EmptyBody(AgentId),
}

/// Phase of the game in which a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Initialization,
    Turn(u32),
    EndGame,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Initialization => write!(f, "initialization"),
            GamePhase::Turn(turn) => write!(f, "turn {turn}"),
            GamePhase::EndGame => write!(f, "end of game"),
        }
    }
}

/// Fatal game errors.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("ruleset failed during {phase}: {source}")]
    Ruleset {
        phase: GamePhase,
        #[source]
        source: RulesetError,
    },

    #[error("projection failed during {phase}: {source}")]
    Projection {
        phase: GamePhase,
        #[source]
        source: ProjectionError,
    },

    #[error("cannot {action} while the game is {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

impl GameError {
    /// The phase the error is attributed to, for diagnostics.
    pub fn phase(&self) -> Option<GamePhase> {
        match self {
            GameError::Ruleset { phase, .. } | GameError::Projection { phase, .. } => {
                Some(*phase)
            }
            GameError::InvalidTransition { .. } => None,
        }
    }
}

/// Result type for game loop operations.
pub type Result<T> = std::result::Result<T, GameError>;
