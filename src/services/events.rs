//! Push Events
//!
//! Real-time notifications delivered on named channels (e.g., `ladder-7`).

use std::sync::Arc;

/// A notification received on a push channel
#[derive(Clone, Debug, PartialEq)]
pub struct PushEvent {
    /// Channel name (e.g., "ladder-7")
    pub channel: Arc<str>,
    /// Event name (e.g., "players-updated")
    pub event: Arc<str>,
    /// Event payload as sent by the server
    pub payload: serde_json::Value,
}

impl PushEvent {
    pub fn new(
        channel: impl Into<Arc<str>>,
        event: impl Into<Arc<str>>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            payload,
        }
    }
}
