//! Move collection for one turn.
//!
//! Every live agent gets exactly one move request. A request that fails for
//! any reason (connect error, timeout, non-2xx, undecodable body, unknown
//! move) is absorbed by reusing the agent's last accepted move. Eliminated
//! agents are not asked.
//!
//! In concurrent mode one task is spawned per agent and the turn waits for
//! all of them. Stragglers are not cancelled; each request is bounded by the
//! transport's own timeout.

use std::sync::Arc;
use std::time::Duration;

use arena_proto::Projection;
use futures::future::join_all;
use reqwest::Url;
use tokio::time::Instant;
use tracing::debug;

use crate::agent::AgentRegistry;
use crate::config::DispatchMode;
use crate::error::ProjectionError;
use crate::model::{AgentId, Direction, Move, TurnContext};
use crate::obs::emit_move_fallback;
use crate::projection::StateProjector;
use crate::transport::AgentTransport;

/// Where a turn's move came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveSource {
    Reply,
    Fallback { reason: String },
}

/// Result of polling one agent.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub agent_id: AgentId,
    pub direction: Direction,
    pub shout: String,
    pub latency: Duration,
    pub source: MoveSource,
}

impl MoveOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, MoveSource::Fallback { .. })
    }
}

/// Moves collected for a turn, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub moves: Vec<Move>,
    pub outcomes: Vec<MoveOutcome>,
}

impl DispatchReport {
    pub fn fallbacks(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fallback()).count()
    }
}

struct MoveRequest {
    agent_id: AgentId,
    endpoint: Url,
    fallback: Direction,
    payload: Projection,
}

/// Fans move requests out to live agents.
pub struct MoveDispatcher {
    transport: Arc<dyn AgentTransport>,
    mode: DispatchMode,
}

impl MoveDispatcher {
    pub fn new(transport: Arc<dyn AgentTransport>, mode: DispatchMode) -> Self {
        Self { transport, mode }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Collect one move per live agent and record them in `registry`.
    ///
    /// Only projection failures are returned as errors; agent failures become
    /// fallback moves.
    pub async fn collect(
        &self,
        ctx: &TurnContext<'_>,
        projector: &StateProjector,
        registry: &mut AgentRegistry,
    ) -> Result<DispatchReport, ProjectionError> {
        let mut requests = Vec::new();
        for agent in registry.iter().filter(|a| ctx.state.is_alive(&a.id)) {
            requests.push(MoveRequest {
                agent_id: agent.id.clone(),
                endpoint: agent.endpoint.clone(),
                fallback: agent.last_move,
                payload: projector.project(ctx.turn, ctx.state, registry, &agent.id)?,
            });
        }

        let outcomes = match self.mode {
            DispatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(requests.len());
                for request in requests {
                    outcomes.push(poll(Arc::clone(&self.transport), request).await);
                }
                outcomes
            }
            DispatchMode::Concurrent => {
                let fallbacks: Vec<(AgentId, Direction)> = requests
                    .iter()
                    .map(|r| (r.agent_id.clone(), r.fallback))
                    .collect();
                let tasks = requests
                    .into_iter()
                    .map(|request| tokio::spawn(poll(Arc::clone(&self.transport), request)));

                join_all(tasks)
                    .await
                    .into_iter()
                    .zip(fallbacks)
                    .map(|(joined, (agent_id, fallback))| {
                        joined.unwrap_or_else(|e| MoveOutcome {
                            agent_id,
                            direction: fallback,
                            shout: String::new(),
                            latency: Duration::ZERO,
                            source: MoveSource::Fallback {
                                reason: format!("move task failed: {e}"),
                            },
                        })
                    })
                    .collect::<Vec<_>>()
            }
        };

        let mut moves = Vec::with_capacity(outcomes.len());
        for outcome in &outcomes {
            if let Some(agent) = registry.get_mut(&outcome.agent_id) {
                agent.last_latency = Some(outcome.latency);
                match &outcome.source {
                    MoveSource::Reply => {
                        agent.last_move = outcome.direction;
                        agent.last_shout = outcome.shout.clone();
                    }
                    MoveSource::Fallback { reason } => {
                        agent.last_shout.clear();
                        emit_move_fallback(ctx.turn, &agent.name, outcome.direction.as_str(), reason);
                    }
                }
            }

            moves.push(Move {
                agent_id: outcome.agent_id.clone(),
                direction: outcome.direction,
                shout: (!outcome.shout.is_empty()).then(|| outcome.shout.clone()),
            });
        }

        Ok(DispatchReport { moves, outcomes })
    }
}

async fn poll(transport: Arc<dyn AgentTransport>, request: MoveRequest) -> MoveOutcome {
    let started = Instant::now();
    let result = transport
        .request_move(&request.endpoint, &request.payload)
        .await;
    let latency = started.elapsed();

    match result {
        Ok(response) => {
            debug!(agent = %request.agent_id, direction = %response.direction, "move received");
            MoveOutcome {
                agent_id: request.agent_id,
                direction: response.direction,
                shout: response.shout,
                latency,
                source: MoveSource::Reply,
            }
        }
        Err(err) => MoveOutcome {
            agent_id: request.agent_id,
            direction: request.fallback,
            shout: String::new(),
            latency,
            source: MoveSource::Fallback {
                reason: err.to_string(),
            },
        },
    }
}
