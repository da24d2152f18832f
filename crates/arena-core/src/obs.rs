//! Structured lifecycle events.
//!
//! Every event carries an `event` field so log pipelines can filter on it:
//! `game.started`, `turn.completed`, `move.fallback`, `notify.failed`,
//! `probe.failed`, `config.warning`, `game.finished`.

use tracing::{info, warn};

use crate::model::Outcome;

/// Span scoping every event of one game run. `game_id` is filled in by
/// [`record_game_id`] once the ID has been drawn.
pub fn game_span() -> tracing::Span {
    tracing::info_span!("arena.game", game_id = tracing::field::Empty)
}

/// Record `game_id` on the current span, if it declares that field.
pub fn record_game_id(game_id: &str) {
    tracing::Span::current().record("game_id", tracing::field::display(game_id));
}

pub fn emit_game_started(game_id: &str, game_type: &str, agents: usize, seed: u64) {
    info!(
        event = "game.started",
        game_id = %game_id,
        game_type = %game_type,
        agents = agents,
        seed = seed,
    );
}

/// Emit event: a turn was applied.
pub fn emit_turn_completed(turn: u32, live_agents: usize, fallbacks: usize) {
    info!(
        event = "turn.completed",
        turn = turn,
        live_agents = live_agents,
        fallbacks = fallbacks,
    );
}

/// Emit event: an agent's move request failed and its last move was reused.
pub fn emit_move_fallback(turn: u32, agent: &str, fallback: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "move.fallback",
        turn = turn,
        agent = %agent,
        fallback = %fallback,
        error = %error,
        "move request failed, reusing last move"
    );
}

/// Emit event: a start or end notification could not be delivered.
pub fn emit_notify_failed(notice: &str, agent: &str, error: &dyn std::fmt::Display) {
    warn!(event = "notify.failed", notice = %notice, agent = %agent, error = %error);
}

/// Emit event: the capability probe failed; the API version stays unknown.
pub fn emit_probe_failed(endpoint: &str, error: &dyn std::fmt::Display) {
    warn!(event = "probe.failed", endpoint = %endpoint, error = %error);
}

/// Emit event: a configuration entry was missing or invalid and was defaulted.
pub fn emit_config_warning(message: &str) {
    warn!(event = "config.warning", "{}", message);
}

/// Emit event: the game reached its terminal state.
pub fn emit_game_finished(turns: u32, outcome: &Outcome) {
    match outcome {
        Outcome::SoloCompleted => info!(
            event = "game.finished",
            turns = turns,
            "game completed after {} turns",
            turns
        ),
        Outcome::Draw => info!(
            event = "game.finished",
            turns = turns,
            "game completed after {} turns, it was a draw",
            turns
        ),
        Outcome::Winner { name, .. } => info!(
            event = "game.finished",
            turns = turns,
            winner = %name,
            "game completed after {} turns, {} is the winner",
            turns,
            name
        ),
        Outcome::SquadWinner { squad, name, .. } => info!(
            event = "game.finished",
            turns = turns,
            winner = %name,
            squad = %squad,
            "game completed after {} turns, squad {} is the winner",
            turns,
            squad
        ),
    }
}
