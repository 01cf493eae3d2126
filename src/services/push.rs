//! Push Hub
//!
//! In-process fan-out of real-time notifications. A transport (websocket,
//! test harness) publishes into the hub; views subscribe to the channel and
//! event they care about and drain their receiver on their own schedule.

use ahash::AHashMap;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::events::PushEvent;

type Key = (String, String);

/// Channel/event subscription registry
#[derive(Default)]
pub struct PushHub {
    subscribers: Mutex<AHashMap<Key, Vec<Sender<PushEvent>>>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event on one channel
    pub fn subscribe(&self, channel: &str, event: &str) -> Receiver<PushEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers
            .lock()
            .entry((channel.to_string(), event.to_string()))
            .or_default()
            .push(tx);
        tracing::debug!("Subscribed to {}/{}", channel, event);
        rx
    }

    /// Deliver an event to every live subscriber; returns how many got it
    ///
    /// Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> usize {
        let key = (channel.to_string(), event.to_string());
        let mut subscribers = self.subscribers.lock();
        let Some(senders) = subscribers.get_mut(&key) else {
            return 0;
        };

        let message = PushEvent::new(channel, event, payload);
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            subscribers.remove(&key);
        }
        delivered
    }

    /// Number of live subscriptions for a channel/event pair
    pub fn subscriber_count(&self, channel: &str, event: &str) -> usize {
        self.subscribers
            .lock()
            .get(&(channel.to_string(), event.to_string()))
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for PushHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushHub")
            .field("subscriptions", &self.subscribers.lock().len())
            .finish()
    }
}
