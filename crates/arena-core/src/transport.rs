//! Client side of the remote agent HTTP contract.
//!
//! - `GET  {endpoint}`        capability probe
//! - `POST {endpoint}/start`  game start notification
//! - `POST {endpoint}/move`   move request
//! - `POST {endpoint}/end`    game end notification
//!
//! [`AgentTransport`] is the seam the engine talks through; [`HttpTransport`]
//! is the `reqwest` implementation. In-memory fakes live in [`crate::fakes`].

use std::time::Duration;

use arena_proto::{Direction, MoveReply, PingReply, Projection};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GameConfig;
use crate::error::{TransportError, TransportResult};

/// Accepted move plus its optional annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResponse {
    pub direction: Direction,
    pub shout: String,
}

impl MoveResponse {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            shout: String::new(),
        }
    }
}

/// One-way notifications whose replies are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Start,
    End,
}

impl Notice {
    pub fn path(&self) -> &'static str {
        match self {
            Notice::Start => "start",
            Notice::End => "end",
        }
    }
}

/// Requests the engine sends to agents.
///
/// Implementations bound every call by their own timeout; expiry is reported
/// as an ordinary error. No call is retried.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Probe the agent's root for its declared capabilities.
    async fn probe(&self, endpoint: &Url) -> TransportResult<PingReply>;

    /// Send a start or end notification.
    async fn notify(
        &self,
        endpoint: &Url,
        notice: Notice,
        payload: &Projection,
    ) -> TransportResult<()>;

    /// Ask for a move. The reply's move is validated against the vocabulary.
    async fn request_move(
        &self,
        endpoint: &Url,
        payload: &Projection,
    ) -> TransportResult<MoveResponse>;
}

/// Join `action` onto the endpoint's path: `http://h/snake` -> `http://h/snake/move`.
pub fn action_url(endpoint: &Url, action: &str) -> Url {
    let mut url = endpoint.clone();
    let base = endpoint.path().trim_end_matches('/');
    url.set_path(&format!("{base}/{action}"));
    url
}

/// `reqwest`-backed transport sharing one connection pool across all agents.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("arena/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Build a client bounded by the config's effective timeout, the same
    /// value agents are told in `game.timeout`.
    pub fn for_config(config: &GameConfig) -> TransportResult<Self> {
        Self::new(config.request_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn decode<T: DeserializeOwned>(
        url: &Url,
        response: reqwest::Response,
    ) -> TransportResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|e| request_error(url, e))?;
        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn post(&self, url: &Url, payload: &Projection) -> TransportResult<reqwest::Response> {
        self.client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| request_error(url, e))
    }
}

fn request_error(url: &Url, err: reqwest::Error) -> TransportError {
    let reason = if err.is_timeout() {
        "timed out".to_string()
    } else {
        err.to_string()
    };
    TransportError::Request {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn probe(&self, endpoint: &Url) -> TransportResult<PingReply> {
        let response = self
            .client
            .get(endpoint.clone())
            .send()
            .await
            .map_err(|e| request_error(endpoint, e))?;
        Self::decode(endpoint, response).await
    }

    async fn notify(
        &self,
        endpoint: &Url,
        notice: Notice,
        payload: &Projection,
    ) -> TransportResult<()> {
        let url = action_url(endpoint, notice.path());
        let response = self.post(&url, payload).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(url = %url, status = %status, "notification delivered");
        Ok(())
    }

    async fn request_move(
        &self,
        endpoint: &Url,
        payload: &Projection,
    ) -> TransportResult<MoveResponse> {
        let url = action_url(endpoint, "move");
        let response = self.post(&url, payload).await?;
        let reply: MoveReply = Self::decode(&url, response).await?;
        let direction = reply
            .direction()
            .map_err(|source| TransportError::UnknownMove {
                url: url.to_string(),
                source,
            })?;
        Ok(MoveResponse {
            direction,
            shout: reply.clipped_shout(),
        })
    }
}
