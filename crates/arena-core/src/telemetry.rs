//! Tracing initialisation for binaries driving a game.
//!
//! Call [`init_tracing`] once at program start. The filter is read from
//! `ARENA_LOG`, then `RUST_LOG`; without either, this crate logs at the given
//! level and everything else at `warn`.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ARENA_LOG";

/// Filter used by [`init_tracing`].
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter(level))
}

fn default_filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!("warn,arena_core={}", level.as_str().to_lowercase()))
}

/// Install the global subscriber. Returns `false` when one was already set,
/// in which case nothing changes.
///
/// JSON output flattens event fields and attaches the `arena.game` span, so
/// each line carries its `game_id`. Text output closes the game span with its
/// total duration.
pub fn init_tracing(json: bool, level: Level) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_level_to_this_crate() {
        let filter = default_filter(Level::DEBUG).to_string();
        assert!(filter.contains("arena_core=debug"), "{filter}");
        assert!(filter.contains("warn"), "{filter}");
    }
}
