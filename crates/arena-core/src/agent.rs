//! Agent identities and the per-game registry.

use std::collections::HashMap;
use std::time::Duration;

use arena_proto::PingReply;
use reqwest::Url;

use crate::model::{AgentId, Direction};

/// Display glyphs, assigned by configuration index modulo their count.
pub const GLYPHS: [char; 8] = ['■', '⌀', '●', '⍟', '◘', '☺', '□', '☻'];

/// API version recorded when the capability probe fails.
pub const UNKNOWN_API_VERSION: &str = "unknown";

/// Move remembered before an agent ever answered.
pub const DEFAULT_MOVE: Direction = Direction::Up;

/// Optional metadata returned by the capability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentMetadata {
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
    pub version: String,
}

impl From<PingReply> for AgentMetadata {
    fn from(ping: PingReply) -> Self {
        Self {
            author: ping.author,
            color: ping.color,
            head: ping.head,
            tail: ping.tail,
            version: ping.version,
        }
    }
}

/// A remote agent taking part in the game.
///
/// Created once by the directory. Eliminated agents keep their record.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub endpoint: Url,
    /// Team label, empty outside squad games.
    pub squad: String,
    pub api_version: String,
    pub metadata: Option<AgentMetadata>,
    pub glyph: char,
    /// Last accepted move, reused when a move request fails.
    pub last_move: Direction,
    pub last_shout: String,
    pub last_latency: Option<Duration>,
}

impl Agent {
    pub fn new(id: AgentId, name: String, endpoint: Url, glyph: char) -> Self {
        Self {
            id,
            name,
            endpoint,
            squad: String::new(),
            api_version: UNKNOWN_API_VERSION.to_string(),
            metadata: None,
            glyph,
            last_move: DEFAULT_MOVE,
            last_shout: String::new(),
            last_latency: None,
        }
    }

    /// Latency in whole milliseconds as reported to other agents.
    pub fn latency_label(&self) -> String {
        self.last_latency
            .map(|latency| latency.as_millis().to_string())
            .unwrap_or_else(|| "0".to_string())
    }
}

/// Agents in configuration order, addressable by ID.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<Agent>) -> Self {
        let index = agents
            .iter()
            .enumerate()
            .map(|(i, agent)| (agent.id.clone(), i))
            .collect();
        Self { agents, index }
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.index.get(id).map(|&i| &self.agents[i])
    }

    pub fn get_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.agents[i]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Display name for `id`, or the ID itself for unknown agents.
    pub fn name_of(&self, id: &AgentId) -> String {
        self.get(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
