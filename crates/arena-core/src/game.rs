//! The turn loop.
//!
//! ```text
//! Uninitialized --initialize--> InProgress --step*--> Terminal
//! ```
//!
//! `initialize` seeds the random source, draws the game ID, resolves agents,
//! builds the ruleset and initial board, and sends `/start` to every agent.
//! Each `step` plays one turn: project the board, collect moves, ask the
//! ruleset for the next board. Termination is checked against the board each
//! turn produced, before the next turn starts, so every game plays at least
//! one turn.
//!
//! Ruleset and projection failures are fatal and returned as [`GameError`];
//! agent failures never are.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn, Instrument};

use crate::agent::AgentRegistry;
use crate::config::GameConfig;
use crate::directory::{random_uuid, AgentDirectory};
use crate::dispatch::MoveDispatcher;
use crate::endgame::EndGameEvaluator;
use crate::error::{GameError, GamePhase, Result, RulesetError};
use crate::model::{BoardState, GameResult, GameType, Outcome, TurnContext};
use crate::obs::{
    emit_game_finished, emit_game_started, emit_notify_failed, emit_turn_completed, game_span,
    record_game_id,
};
use crate::projection::StateProjector;
use crate::render::{AgentLabel, RenderFrame, Renderer};
use crate::ruleset::{Ruleset, RulesetFactory, RulesetSettings};
use crate::transport::{AgentTransport, Notice};

/// What a call to [`GameLoop::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Played { turn: u32, fallbacks: usize },
    Finished,
}

struct Running {
    game_id: String,
    ruleset: Box<dyn Ruleset>,
    registry: AgentRegistry,
    labels: Vec<AgentLabel>,
    projector: StateProjector,
    state: BoardState,
    turn: u32,
}

enum Phase {
    Uninitialized,
    InProgress(Box<Running>),
    Terminal(GameResult),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::InProgress(_) => "in progress",
            Phase::Terminal(_) => "terminal",
        }
    }
}

/// Owns the authoritative board and drives the game turn by turn.
pub struct GameLoop {
    config: GameConfig,
    transport: Arc<dyn AgentTransport>,
    factory: Arc<dyn RulesetFactory>,
    renderer: Option<Box<dyn Renderer>>,
    phase: Phase,
}

impl GameLoop {
    /// `transport` should enforce `config`'s effective timeout, which is what
    /// agents are told in `game.timeout`; see [`HttpTransport::for_config`].
    ///
    /// [`HttpTransport::for_config`]: crate::transport::HttpTransport::for_config
    pub fn new(
        config: GameConfig,
        transport: Arc<dyn AgentTransport>,
        factory: Arc<dyn RulesetFactory>,
    ) -> Self {
        Self {
            config,
            transport,
            factory,
            renderer: None,
            phase: Phase::Uninitialized,
        }
    }

    /// Attach a renderer, invoked each turn when `config.render` is set.
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// `"uninitialized"`, `"in progress"` or `"terminal"`.
    pub fn state_name(&self) -> &'static str {
        self.phase.name()
    }

    pub fn game_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::InProgress(running) => Some(&running.game_id),
            Phase::Terminal(result) => Some(&result.game_id),
            Phase::Uninitialized => None,
        }
    }

    /// Turns played so far.
    pub fn turn(&self) -> u32 {
        match &self.phase {
            Phase::InProgress(running) => running.turn,
            Phase::Terminal(result) => result.turn,
            Phase::Uninitialized => 0,
        }
    }

    /// The current board.
    pub fn board(&self) -> Option<&BoardState> {
        match &self.phase {
            Phase::InProgress(running) => Some(&running.state),
            Phase::Terminal(result) => Some(&result.board),
            Phase::Uninitialized => None,
        }
    }

    pub fn agents(&self) -> Option<&AgentRegistry> {
        match &self.phase {
            Phase::InProgress(running) => Some(&running.registry),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&GameResult> {
        match &self.phase {
            Phase::Terminal(result) => Some(result),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            state: self.phase.name(),
            action,
        }
    }

    /// Set up the game and notify every agent that it started.
    pub async fn initialize(&mut self) -> Result<()> {
        if !matches!(self.phase, Phase::Uninitialized) {
            return Err(self.invalid("initialize"));
        }
        let config = &self.config;
        let phase = GamePhase::Initialization;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let game_id = random_uuid(&mut rng).to_string();
        record_game_id(&game_id);

        let registry = AgentDirectory::new(Arc::clone(&self.transport))
            .resolve(config, &mut rng)
            .await;

        let squads: BTreeMap<_, _> = if config.game_type == GameType::Squad {
            registry
                .iter()
                .map(|a| (a.id.clone(), a.squad.clone()))
                .collect()
        } else {
            BTreeMap::new()
        };

        let mut ruleset = self
            .factory
            .build(RulesetSettings {
                game_type: config.game_type,
                seed: config.seed,
                rng,
                squads,
            })
            .map_err(|source| GameError::Ruleset { phase, source })?;

        let state = ruleset
            .create_initial_state(config.width, config.height, &registry.ids())
            .map_err(|source| GameError::Ruleset { phase, source })?;

        let projector = StateProjector::new(game_id.clone(), config.effective_timeout_ms());
        emit_game_started(
            &game_id,
            config.game_type.as_str(),
            registry.len(),
            config.seed,
        );

        for agent in registry.iter() {
            let payload = projector
                .project(0, &state, &registry, &agent.id)
                .map_err(|source| GameError::Projection { phase, source })?;
            if let Err(err) = self
                .transport
                .notify(&agent.endpoint, Notice::Start, &payload)
                .await
            {
                emit_notify_failed("start", &agent.name, &err);
            }
        }

        if config.render && self.renderer.is_none() {
            warn!("rendering enabled but no renderer attached, logging board state instead");
        }

        let labels = registry
            .iter()
            .map(|a| AgentLabel {
                id: a.id.clone(),
                name: a.name.clone(),
                glyph: a.glyph,
            })
            .collect();

        self.phase = Phase::InProgress(Box::new(Running {
            game_id,
            ruleset,
            registry,
            labels,
            projector,
            state,
            turn: 0,
        }));
        Ok(())
    }

    /// Play one turn, or finish the game if the last board is terminal.
    ///
    /// Calling `step` after the game finished is a no-op returning
    /// [`TurnStatus::Finished`].
    pub async fn step(&mut self) -> Result<TurnStatus> {
        let running = match &mut self.phase {
            Phase::InProgress(running) => &mut **running,
            Phase::Terminal(_) => return Ok(TurnStatus::Finished),
            Phase::Uninitialized => {
                return Err(GameError::InvalidTransition {
                    state: "uninitialized",
                    action: "step",
                })
            }
        };

        if running.turn > 0 && running.ruleset.is_game_over(&running.state) {
            let outcome = EndGameEvaluator::new(Arc::clone(&self.transport))
                .evaluate(
                    self.config.game_type,
                    running.turn,
                    &running.state,
                    &running.registry,
                    &running.projector,
                )
                .await
                .map_err(|source| GameError::Projection {
                    phase: GamePhase::EndGame,
                    source,
                })?;
            self.finish(outcome);
            return Ok(TurnStatus::Finished);
        }

        let turn = running.turn + 1;
        let phase = GamePhase::Turn(turn);
        let dispatcher =
            MoveDispatcher::new(Arc::clone(&self.transport), self.config.dispatch_mode());

        let (next, fallbacks) = {
            let mut ctx = TurnContext::new(turn, &running.state);
            let report = dispatcher
                .collect(&ctx, &running.projector, &mut running.registry)
                .await
                .map_err(|source| GameError::Projection { phase, source })?;
            let fallbacks = report.fallbacks();
            ctx.moves = report.moves;

            let mut next = running
                .ruleset
                .create_next_state(ctx.state, &ctx.moves)
                .map_err(|source| GameError::Ruleset { phase, source })?;
            if next.width != ctx.state.width || next.height != ctx.state.height {
                return Err(GameError::Ruleset {
                    phase,
                    source: RulesetError::InvalidState(format!(
                        "board resized from {}x{} to {}x{}",
                        ctx.state.width, ctx.state.height, next.width, next.height
                    )),
                });
            }
            next.turn = turn;
            (next, fallbacks)
        };

        running.state = next;
        running.turn = turn;
        emit_turn_completed(turn, running.state.live_snakes().count(), fallbacks);

        match self.renderer.as_mut().filter(|_| self.config.render) {
            Some(renderer) => renderer.render(&RenderFrame {
                turn,
                seed: self.config.seed,
                game_type: self.config.game_type,
                board: &running.state,
                hazards: &running.state.hazards,
                agents: &running.labels,
            }),
            None => debug!(turn = turn, state = ?running.state, "board state"),
        }

        Ok(TurnStatus::Played { turn, fallbacks })
    }

    fn finish(&mut self, outcome: Outcome) {
        let phase = std::mem::replace(&mut self.phase, Phase::Uninitialized);
        self.phase = match phase {
            Phase::InProgress(running) => {
                let running = *running;
                emit_game_finished(running.turn, &outcome);
                let winner = match &outcome {
                    Outcome::Winner { name, .. } | Outcome::SquadWinner { name, .. } => {
                        name.clone()
                    }
                    Outcome::Draw | Outcome::SoloCompleted => String::new(),
                };
                Phase::Terminal(GameResult {
                    game_id: running.game_id,
                    turn: running.turn,
                    winner,
                    outcome,
                    board: running.state,
                })
            }
            other => other,
        };
    }

    /// Play a whole game: initialize, step until terminal, return the result.
    ///
    /// Everything logged from here on, setup included, runs inside the
    /// `arena.game` span.
    pub async fn run(mut self) -> Result<GameResult> {
        async move {
            match self.game_id().map(str::to_owned) {
                Some(game_id) => record_game_id(&game_id),
                None => self.initialize().await?,
            }
            while let TurnStatus::Played { .. } = self.step().await? {}
            match self.phase {
                Phase::Terminal(result) => Ok(result),
                other => Err(GameError::InvalidTransition {
                    state: other.name(),
                    action: "collect the result",
                }),
            }
        }
        .instrument(game_span())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{AgentScript, ScriptedTransport, StepRuleset};
    use crate::model::Direction;
    use tracing_test::traced_test;

    #[traced_test]
    #[tokio::test]
    async fn test_setup_events_are_logged_inside_the_game_span() {
        let config = GameConfig::new(11, 11)
            .with_agent("alpha", "http://alpha.test")
            .with_agent("ghost", "http://ghost.test")
            .with_seed(4);
        let transport = ScriptedTransport::new().with_agent(
            "http://alpha.test",
            AgentScript::replying(&[Direction::Down, Direction::Up]),
        );
        let result = GameLoop::new(config, Arc::new(transport), Arc::new(StepRuleset::factory))
            .run()
            .await
            .unwrap();

        let scope = format!("arena.game{{game_id={}}}", result.game_id);
        logs_assert(|lines: &[&str]| {
            for event in ["probe.failed", "game.started", "notify.failed", "game.finished"] {
                let line = lines
                    .iter()
                    .find(|line| line.contains(event))
                    .ok_or_else(|| format!("no {event} event"))?;
                if !line.contains(&scope) {
                    return Err(format!("{event} logged outside {scope}: {line}"));
                }
            }
            Ok(())
        });
    }
}
