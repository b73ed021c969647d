//! JSON message protocol for the live transcript feed.

use serde::{Deserialize, Serialize};

/// Events pushed by the feed server to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Sent once when a client connects.
    Hello { version: String },
    /// One transcript update: the just-produced phrase text, whether it
    /// started a new line, and the full transcript so a client joining
    /// mid-session catches up on its first event.
    Phrase {
        finalized: bool,
        text: String,
        transcript: Vec<String>,
    },
}

impl FeedEvent {
    /// Serialize the event to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize an event from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
