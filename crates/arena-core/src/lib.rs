//! Arena Core Library
//!
//! Turn orchestration for a local multi-agent snake game. Remote agents are
//! HTTP services; the board rules and the terminal renderer are supplied by
//! the caller through the [`Ruleset`] and [`Renderer`] traits.
//!
//! ```ignore
//! let config = GameConfig::new(11, 11)
//!     .with_agent("alpha", "http://localhost:8000")
//!     .with_agent("beta", "http://localhost:8001");
//! // The transport must enforce the same timeout the projection advertises.
//! let transport = Arc::new(HttpTransport::for_config(&config)?);
//! let result = GameLoop::new(config, transport, Arc::new(my_ruleset_factory))
//!     .run()
//!     .await?;
//! ```

pub mod agent;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod endgame;
pub mod error;
pub mod fakes;
pub mod game;
pub mod model;
pub mod obs;
pub mod projection;
pub mod render;
pub mod ruleset;
pub mod telemetry;
pub mod transport;

pub use agent::{Agent, AgentMetadata, AgentRegistry, DEFAULT_MOVE, GLYPHS, UNKNOWN_API_VERSION};
pub use config::{DispatchMode, GameConfig, PlayArgs, DEFAULT_BOARD_SIZE, DEFAULT_TIMEOUT_MS};
pub use directory::{AgentDirectory, PLACEHOLDER_ENDPOINT};
pub use dispatch::{DispatchReport, MoveDispatcher, MoveOutcome, MoveSource};
pub use endgame::EndGameEvaluator;
pub use error::{
    GameError, GamePhase, ProjectionError, Result, RulesetError, TransportError, TransportResult,
};
pub use game::{GameLoop, TurnStatus};
pub use model::{
    AgentId, BoardState, Coord, Direction, Elimination, EliminationCause, GameResult, GameType,
    Move, Outcome, SnakeState, TurnContext,
};
pub use projection::StateProjector;
pub use render::{AgentLabel, RenderFrame, Renderer};
pub use ruleset::{Ruleset, RulesetFactory, RulesetSettings};
pub use telemetry::init_tracing;
pub use transport::{AgentTransport, HttpTransport, MoveResponse, Notice};

pub use arena_proto::{MoveReply, PingReply, Projection};

/// Crate version, reported in the HTTP user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
