//! Outcome classification once the ruleset reports game over.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::agent::AgentRegistry;
use crate::error::ProjectionError;
use crate::model::{AgentId, BoardState, GameType, Outcome};
use crate::obs::emit_notify_failed;
use crate::projection::StateProjector;
use crate::transport::{AgentTransport, Notice};

/// Inspects the terminal board and notifies the winner.
pub struct EndGameEvaluator {
    transport: Arc<dyn AgentTransport>,
}

impl EndGameEvaluator {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    /// Classify the terminal `state`.
    ///
    /// - solo games only report completion
    /// - no survivor is a draw; nobody is notified
    /// - a single survivor wins and receives the `/end` notification
    /// - in squad games every survivor receives `/end`; the squad wins when
    ///   all survivors share it
    ///
    /// Several survivors outside squad games should not happen once the
    /// ruleset reports game over; it is logged and reported as a draw.
    pub async fn evaluate(
        &self,
        game_type: GameType,
        turn: u32,
        state: &BoardState,
        registry: &AgentRegistry,
        projector: &StateProjector,
    ) -> Result<Outcome, ProjectionError> {
        if game_type == GameType::Solo {
            return Ok(Outcome::SoloCompleted);
        }

        let survivors: Vec<&AgentId> = state.live_snakes().map(|s| &s.id).collect();
        match survivors.as_slice() {
            [] => Ok(Outcome::Draw),
            [winner] => {
                self.notify_end(turn, state, registry, projector, winner)
                    .await?;
                Ok(Outcome::Winner {
                    agent_id: (*winner).clone(),
                    name: registry.name_of(winner),
                })
            }
            many if game_type == GameType::Squad => {
                for id in many {
                    self.notify_end(turn, state, registry, projector, id).await?;
                }
                let squads: BTreeSet<&str> = many
                    .iter()
                    .map(|id| registry.get(id).map_or("", |a| a.squad.as_str()))
                    .collect();
                match squads.into_iter().collect::<Vec<_>>().as_slice() {
                    [squad] => Ok(Outcome::SquadWinner {
                        squad: squad.to_string(),
                        agent_ids: many.iter().map(|id| (*id).clone()).collect(),
                        name: registry.name_of(many[many.len() - 1]),
                    }),
                    squads => {
                        warn!(
                            squads = squads.len(),
                            "game over reported with several squads alive, treating as a draw"
                        );
                        Ok(Outcome::Draw)
                    }
                }
            }
            many => {
                warn!(
                    survivors = many.len(),
                    "game over reported with several survivors, treating as a draw"
                );
                Ok(Outcome::Draw)
            }
        }
    }

    async fn notify_end(
        &self,
        turn: u32,
        state: &BoardState,
        registry: &AgentRegistry,
        projector: &StateProjector,
        id: &AgentId,
    ) -> Result<(), ProjectionError> {
        let payload = projector.project(turn, state, registry, id)?;
        if let Some(agent) = registry.get(id) {
            if let Err(err) = self
                .transport
                .notify(&agent.endpoint, Notice::End, &payload)
                .await
            {
                emit_notify_failed("end", &agent.name, &err);
            }
        }
        Ok(())
    }
}
