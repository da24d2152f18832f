//! In-memory fakes for the transport and ruleset seams (testing only)
//!
//! - [`ScriptedTransport`] answers probes, notifications and move requests
//!   from per-endpoint scripts and records every call.
//! - [`StepRuleset`] is a tiny deterministic ruleset: heads step one cell per
//!   move, leaving the board eliminates, food is placed from the seeded RNG.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use arena_proto::{ParseDirectionError, PingReply, Projection};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use reqwest::Url;

use crate::error::{RulesetError, TransportError, TransportResult};
use crate::model::{
    AgentId, BoardState, Coord, Direction, Elimination, EliminationCause, GameType, Move,
    SnakeState,
};
use crate::ruleset::{Ruleset, RulesetSettings};
use crate::transport::{action_url, AgentTransport, MoveResponse, Notice};

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// One scripted answer to a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Move(Direction),
    Shout(Direction, String),
    /// Behaves like a connection failure.
    Fail,
    /// A well-formed body naming a move outside the vocabulary.
    Invalid(String),
}

/// Behaviour of one endpoint.
#[derive(Debug, Clone)]
pub struct AgentScript {
    /// `None` makes the endpoint unreachable for probes and notifications.
    pub api_version: Option<String>,
    /// Move replies, cycled by call count. Empty means every request fails.
    pub replies: Vec<Reply>,
    pub delay: Duration,
}

impl AgentScript {
    pub fn replying(moves: &[Direction]) -> Self {
        Self::sequence(moves.iter().copied().map(Reply::Move).collect())
    }

    pub fn sequence(replies: Vec<Reply>) -> Self {
        Self {
            api_version: Some("1".to_string()),
            replies,
            delay: Duration::ZERO,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            api_version: None,
            replies: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_version = Some(version.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A call observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Probe { url: String },
    Notify { url: String, turn: u32, you: String },
    Move { url: String, turn: u32, you: String },
}

#[derive(Debug)]
struct Endpoint {
    script: AgentScript,
    moves_served: usize,
}

/// Transport answering from scripts. Unknown endpoints are unreachable.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    endpoints: Mutex<HashMap<String, Endpoint>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(self, url: &str, script: AgentScript) -> Self {
        let key = normalise(url);
        self.endpoints.lock().unwrap().insert(
            key,
            Endpoint {
                script,
                moves_served: 0,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Turn numbers of move requests sent to `url`.
    pub fn move_turns(&self, url: &str) -> Vec<u32> {
        let target = action_url(&parse(url), "move").to_string();
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Move { url, turn, .. } if url == target => Some(turn),
                _ => None,
            })
            .collect()
    }

    /// Turn numbers of `notice` notifications sent to `url`.
    pub fn notices(&self, url: &str, notice: Notice) -> Vec<u32> {
        let target = action_url(&parse(url), notice.path()).to_string();
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Notify { url, turn, .. } if url == target => Some(turn),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn script(&self, endpoint: &Url) -> Option<AgentScript> {
        self.endpoints
            .lock()
            .unwrap()
            .get(endpoint.as_str())
            .map(|e| e.script.clone())
    }

    fn next_reply(&self, endpoint: &Url) -> (Reply, Duration) {
        let mut endpoints = self.endpoints.lock().unwrap();
        match endpoints.get_mut(endpoint.as_str()) {
            Some(entry) if !entry.script.replies.is_empty() => {
                let replies = &entry.script.replies;
                let reply = replies[entry.moves_served % replies.len()].clone();
                entry.moves_served += 1;
                (reply, entry.script.delay)
            }
            Some(entry) => (Reply::Fail, entry.script.delay),
            None => (Reply::Fail, Duration::ZERO),
        }
    }
}

fn parse(url: &str) -> Url {
    Url::parse(url).expect("scripted endpoints must be valid URLs")
}

fn normalise(url: &str) -> String {
    parse(url).to_string()
}

fn unreachable_error(url: &Url) -> TransportError {
    TransportError::Request {
        url: url.to_string(),
        reason: "connection refused".to_string(),
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn probe(&self, endpoint: &Url) -> TransportResult<PingReply> {
        self.record(Call::Probe {
            url: endpoint.to_string(),
        });
        match self.script(endpoint).and_then(|s| s.api_version) {
            Some(apiversion) => Ok(PingReply {
                apiversion,
                ..PingReply::default()
            }),
            None => Err(unreachable_error(endpoint)),
        }
    }

    async fn notify(
        &self,
        endpoint: &Url,
        notice: Notice,
        payload: &Projection,
    ) -> TransportResult<()> {
        let url = action_url(endpoint, notice.path());
        self.record(Call::Notify {
            url: url.to_string(),
            turn: payload.turn,
            you: payload.you.id.clone(),
        });
        match self.script(endpoint) {
            Some(script) if script.api_version.is_some() => Ok(()),
            _ => Err(unreachable_error(&url)),
        }
    }

    async fn request_move(
        &self,
        endpoint: &Url,
        payload: &Projection,
    ) -> TransportResult<MoveResponse> {
        let url = action_url(endpoint, "move");
        self.record(Call::Move {
            url: url.to_string(),
            turn: payload.turn,
            you: payload.you.id.clone(),
        });

        let (reply, delay) = self.next_reply(endpoint);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Move(direction) => Ok(MoveResponse::new(direction)),
            Reply::Shout(direction, shout) => Ok(MoveResponse { direction, shout }),
            Reply::Fail => Err(unreachable_error(&url)),
            Reply::Invalid(raw) => Err(TransportError::UnknownMove {
                url: url.to_string(),
                source: ParseDirectionError(raw),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// StepRuleset
// ---------------------------------------------------------------------------

/// Health every snake starts with.
pub const STEP_START_HEALTH: i32 = 100;

/// Minimal deterministic ruleset for exercising the loop.
///
/// Snake `i` starts at `(1 + 2i, 1)` with a body of three stacked cells. Each
/// turn every live snake steps in its move's direction and loses one health;
/// eating food restores health and grows the body. Leaving the board or
/// running out of health eliminates. The game is over when at most one snake
/// is alive, at most one squad in squad games, or none in solo games.
#[derive(Debug)]
pub struct StepRuleset {
    rng: StdRng,
    game_type: GameType,
    squads: BTreeMap<AgentId, String>,
}

impl StepRuleset {
    pub fn new(settings: RulesetSettings) -> Self {
        Self {
            rng: settings.rng,
            game_type: settings.game_type,
            squads: settings.squads,
        }
    }

    /// Factory closure usable wherever a `RulesetFactory` is expected.
    pub fn factory(
        settings: RulesetSettings,
    ) -> std::result::Result<Box<dyn Ruleset>, RulesetError> {
        Ok(Box::new(Self::new(settings)))
    }

    fn place_food(&mut self, state: &mut BoardState) {
        let occupied: HashSet<Coord> = state
            .snakes
            .iter()
            .flat_map(|s| s.body.iter().copied())
            .chain(state.food.iter().copied())
            .collect();
        if occupied.len() >= (state.width * state.height) as usize {
            return;
        }
        loop {
            let candidate = Coord::new(
                self.rng.gen_range(0..state.width as i32),
                self.rng.gen_range(0..state.height as i32),
            );
            if !occupied.contains(&candidate) {
                state.food.push(candidate);
                return;
            }
        }
    }
}

impl Ruleset for StepRuleset {
    fn create_initial_state(
        &mut self,
        width: u32,
        height: u32,
        agent_ids: &[AgentId],
    ) -> std::result::Result<BoardState, RulesetError> {
        if width == 0 || height < 2 {
            return Err(RulesetError::Construction(format!(
                "board {width}x{height} is too small"
            )));
        }
        let mut state = BoardState::new(width, height);
        for (i, id) in agent_ids.iter().enumerate() {
            let start = Coord::new(((1 + 2 * i) as u32 % width) as i32, 1);
            state.snakes.push(SnakeState::new(
                id.clone(),
                vec![start; 3],
                STEP_START_HEALTH,
            ));
        }
        for _ in 0..agent_ids.len() {
            self.place_food(&mut state);
        }
        Ok(state)
    }

    fn is_game_over(&self, state: &BoardState) -> bool {
        let live = state.live_snakes().count();
        match self.game_type {
            GameType::Solo => live == 0,
            GameType::Squad => {
                let squads: HashSet<_> = state
                    .live_snakes()
                    .map(|s| self.squads.get(&s.id))
                    .collect();
                squads.len() <= 1
            }
            _ => live <= 1,
        }
    }

    fn create_next_state(
        &mut self,
        state: &BoardState,
        moves: &[Move],
    ) -> std::result::Result<BoardState, RulesetError> {
        let mut by_agent: HashMap<&AgentId, Direction> = HashMap::new();
        for m in moves {
            if !state.is_alive(&m.agent_id) {
                return Err(RulesetError::InvalidState(format!(
                    "move for agent {} which is not alive",
                    m.agent_id
                )));
            }
            if by_agent.insert(&m.agent_id, m.direction).is_some() {
                return Err(RulesetError::InvalidState(format!(
                    "duplicate move for agent {}",
                    m.agent_id
                )));
            }
        }

        let turn = state.turn + 1;
        let mut next = state.clone();
        next.turn = turn;
        let mut eaten = 0;

        for snake in next.snakes.iter_mut().filter(|s| s.is_alive()) {
            let direction = *by_agent.get(&snake.id).ok_or_else(|| {
                RulesetError::InvalidState(format!("no move for agent {}", snake.id))
            })?;
            let head = snake.head().ok_or_else(|| {
                RulesetError::InvalidState(format!("agent {} has no body", snake.id))
            })?;
            let (dx, dy) = direction.delta();
            let new_head = Coord::new(head.x + dx, head.y + dy);

            snake.body.insert(0, new_head);
            snake.health -= 1;
            if let Some(pos) = next.food.iter().position(|f| *f == new_head) {
                next.food.remove(pos);
                snake.health = STEP_START_HEALTH;
                eaten += 1;
            } else {
                snake.body.pop();
            }

            let cause = if !state.contains(new_head) {
                Some(EliminationCause::OutOfBounds)
            } else if snake.health <= 0 {
                Some(EliminationCause::OutOfHealth)
            } else {
                None
            };
            if let Some(cause) = cause {
                snake.eliminated = Some(Elimination {
                    cause,
                    turn,
                    by: None,
                });
            }
        }

        for _ in 0..eaten {
            self.place_food(&mut next);
        }
        Ok(next)
    }
}
