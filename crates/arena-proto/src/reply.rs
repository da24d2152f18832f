//! Agent reply bodies.

use serde::{Deserialize, Serialize};

use crate::direction::{Direction, ParseDirectionError};

/// Body of a `/move` response.
///
/// Missing fields decode as empty strings; an empty `move` is rejected by
/// [`MoveReply::direction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReply {
    #[serde(rename = "move", default)]
    pub direction: String,
    #[serde(default)]
    pub shout: String,
}

impl MoveReply {
    /// Validate the reply's move against the fixed vocabulary.
    pub fn direction(&self) -> Result<Direction, ParseDirectionError> {
        self.direction.parse()
    }

    /// Shout clipped to [`crate::MAX_SHOUT_LEN`] characters.
    pub fn clipped_shout(&self) -> String {
        self.shout.chars().take(crate::MAX_SHOUT_LEN).collect()
    }
}

/// Body of the capability probe (`GET {endpoint}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReply {
    #[serde(default)]
    pub apiversion: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub tail: String,
    #[serde(default)]
    pub version: String,
}
