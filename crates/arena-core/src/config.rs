//! Game configuration.
//!
//! [`GameConfig`] is the single configuration value the loop consumes.
//! [`PlayArgs`] is the equivalent command-line surface; binaries flatten it
//! into their own `clap` parser and convert it with `GameConfig::from`.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::model::GameType;

/// Request timeout used when none (or zero) is configured.
pub const DEFAULT_TIMEOUT_MS: u32 = 500;

/// Default board edge length.
pub const DEFAULT_BOARD_SIZE: u32 = 11;

/// How move requests are issued within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// One agent at a time, in configuration order.
    Sequential,
    /// All live agents at once; the turn waits for every reply.
    Concurrent,
}

/// Configuration for one game.
///
/// `names`, `urls` and `squads` are parallel lists indexed by agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: u32,
    pub height: u32,
    pub names: Vec<String>,
    pub urls: Vec<String>,
    pub squads: Vec<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u32,
    pub sequential: bool,
    pub game_type: GameType,
    /// Invoke the renderer every turn.
    pub render: bool,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_SIZE,
            height: DEFAULT_BOARD_SIZE,
            names: Vec::new(),
            urls: Vec::new(),
            squads: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sequential: false,
            game_type: GameType::Standard,
            render: false,
            seed: seed_from_clock(),
        }
    }
}

impl GameConfig {
    /// Create a config for a board of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Add an agent.
    pub fn with_agent(mut self, name: &str, url: &str) -> Self {
        self.names.push(name.to_string());
        self.urls.push(url.to_string());
        self
    }

    /// Add an agent with a squad label.
    pub fn with_squad_agent(mut self, name: &str, url: &str, squad: &str) -> Self {
        self.squads.push(squad.to_string());
        self.with_agent(name, url)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_game_type(mut self, game_type: GameType) -> Self {
        self.game_type = game_type;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    /// Poll agents one at a time instead of concurrently.
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.sequential {
            DispatchMode::Sequential
        } else {
            DispatchMode::Concurrent
        }
    }

    /// Effective timeout in milliseconds; zero means the default.
    pub fn effective_timeout_ms(&self) -> u32 {
        if self.timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.effective_timeout_ms()))
    }
}

/// Seed derived from the wall clock, used when none is configured.
pub fn seed_from_clock() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt()
        .map(|nanos| nanos as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

/// Command-line flags for a local game.
#[derive(Debug, Clone, Args)]
pub struct PlayArgs {
    /// Width of Board
    #[arg(short = 'W', long, default_value_t = DEFAULT_BOARD_SIZE)]
    pub width: u32,

    /// Height of Board
    #[arg(short = 'H', long, default_value_t = DEFAULT_BOARD_SIZE)]
    pub height: u32,

    /// Name of Snake (repeatable)
    #[arg(short = 'n', long = "name")]
    pub names: Vec<String>,

    /// URL of Snake (repeatable)
    #[arg(short = 'u', long = "url")]
    pub urls: Vec<String>,

    /// Squad of Snake (repeatable, squad games only)
    #[arg(short = 'S', long = "squad")]
    pub squads: Vec<String>,

    /// Request Timeout in milliseconds
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u32,

    /// Use Sequential Processing
    #[arg(short = 's', long)]
    pub sequential: bool,

    /// Type of Game Rules
    #[arg(short = 'g', long = "gametype", value_enum, default_value_t = GameType::Standard)]
    pub game_type: GameType,

    /// View the Map Each Turn
    #[arg(short = 'v', long)]
    pub viewmap: bool,

    /// Random Seed (defaults to the current time)
    #[arg(short = 'r', long, env = "ARENA_SEED")]
    pub seed: Option<u64>,
}

impl From<PlayArgs> for GameConfig {
    fn from(args: PlayArgs) -> Self {
        GameConfig {
            width: args.width,
            height: args.height,
            names: args.names,
            urls: args.urls,
            squads: args.squads,
            timeout_ms: args.timeout,
            sequential: args.sequential,
            game_type: args.game_type,
            render: args.viewmap,
            seed: args.seed.unwrap_or_else(seed_from_clock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        play: PlayArgs,
    }

    #[test]
    fn test_defaults_match_play_flags() {
        let config = GameConfig::default();
        assert_eq!(config.width, 11);
        assert_eq!(config.height, 11);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.dispatch_mode(), DispatchMode::Concurrent);
        assert_eq!(config.game_type, GameType::Standard);
        assert!(!config.render);
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let config = GameConfig::new(7, 7).with_timeout_ms(0);
        assert_eq!(config.effective_timeout_ms(), DEFAULT_TIMEOUT_MS);
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_builder_keeps_lists_parallel() {
        let config = GameConfig::new(11, 11)
            .with_squad_agent("a", "http://a", "red")
            .with_squad_agent("b", "http://b", "blue")
            .sequential();
        assert_eq!(config.names, vec!["a", "b"]);
        assert_eq!(config.urls, vec!["http://a", "http://b"]);
        assert_eq!(config.squads, vec!["red", "blue"]);
        assert_eq!(config.dispatch_mode(), DispatchMode::Sequential);
    }

    #[test]
    fn test_play_args_parse_into_config() {
        let cli = TestCli::try_parse_from([
            "arena", "-W", "7", "-H", "9", "-n", "one", "-u", "http://one", "-n", "two", "-u",
            "http://two", "-S", "red", "-S", "red", "-t", "250", "-s", "-g", "squad", "-v",
            "-r", "42",
        ])
        .unwrap();

        let config = GameConfig::from(cli.play);
        assert_eq!((config.width, config.height), (7, 9));
        assert_eq!(config.names, vec!["one", "two"]);
        assert_eq!(config.urls, vec!["http://one", "http://two"]);
        assert_eq!(config.squads, vec!["red", "red"]);
        assert_eq!(config.timeout_ms, 250);
        assert!(config.sequential);
        assert_eq!(config.game_type, GameType::Squad);
        assert!(config.render);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"urls":["http://a"],"game_type":"royale","seed":9}"#)
                .unwrap();
        assert_eq!(config.width, DEFAULT_BOARD_SIZE);
        assert_eq!(config.game_type, GameType::Royale);
        assert_eq!(config.seed, 9);
        assert_eq!(config.urls.len(), 1);
    }
}
