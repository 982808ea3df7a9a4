//! Chat connection management
//! Handles the lifecycle of the single active stream subscription

use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::feed::{spawn_detached, EventSink, FeedHandle};
use crate::core::message::{ChatEvent, ChatMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// State of the service's one logical connection
pub struct ConnectionState {
    stream_id: Option<String>,
    status: ConnectionStatus,
    connection_id: Option<Uuid>,
    epoch: u64,
    connected_at: Option<Instant>,
    sink: Option<EventSink>,
    feed: Option<FeedHandle>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            stream_id: None,
            status: ConnectionStatus::Disconnected,
            connection_id: None,
            epoch: 0,
            connected_at: None,
            sink: None,
            feed: None,
        }
    }

    /// Mark the connection live for `stream_id` under `epoch`.
    ///
    /// Any previous connection is torn down first; its feed handle, if any,
    /// is returned so the caller can stop it.
    pub fn establish(
        &mut self,
        stream_id: &str,
        epoch: u64,
        sink: EventSink,
    ) -> Option<FeedHandle> {
        let previous = self.teardown();

        self.stream_id = Some(stream_id.to_string());
        self.status = ConnectionStatus::Connected;
        self.connection_id = Some(Uuid::new_v4());
        self.epoch = epoch;
        self.connected_at = Some(Instant::now());
        self.sink = Some(sink);

        previous
    }

    /// Hand the running feed to this connection.
    ///
    /// Gives the handle back when `epoch` is no longer the live connection
    /// or a feed is already attached; the caller must stop it.
    pub fn attach_feed(&mut self, epoch: u64, handle: FeedHandle) -> Option<FeedHandle> {
        if !self.is_current(epoch) || self.feed.is_some() {
            return Some(handle);
        }
        self.feed = Some(handle);
        None
    }

    /// Return to `disconnected`. Safe to call repeatedly; only the first call
    /// after `establish` yields the feed handle.
    pub fn teardown(&mut self) -> Option<FeedHandle> {
        if self.status == ConnectionStatus::Connected {
            debug!(
                "Tearing down connection {:?} for stream {:?} after {:?}",
                self.connection_id,
                self.stream_id,
                self.connection_duration()
            );
        }

        self.status = ConnectionStatus::Disconnected;
        self.connected_at = None;
        self.connection_id = None;
        self.sink = None;
        self.feed.take()
    }

    /// Serialize `message` and loop it back through the connection's sink
    /// after `delay`. Returns false when nothing was scheduled.
    pub fn send(&self, message: &ChatMessage, delay: Duration) -> bool {
        let Some(sink) = self.sink.clone() else {
            return false;
        };

        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Dropping outbound message {}: {}", message.id, e);
                return false;
            }
        };

        spawn_detached(async move {
            tokio::time::sleep(delay).await;

            match ChatMessage::from_json(&payload) {
                Ok(echo) => {
                    if !sink.deliver(ChatEvent::Chat(echo)) {
                        debug!("Loop-back dropped: connection closed while in flight");
                    }
                }
                Err(e) => warn!("Failed to decode looped-back message: {}", e),
            }
        })
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Whether `epoch` identifies the live connection
    pub fn is_current(&self, epoch: u64) -> bool {
        self.is_connected() && self.epoch == epoch
    }

    pub fn is_connected_to(&self, stream_id: &str) -> bool {
        self.is_connected() && self.stream_id.as_deref() == Some(stream_id)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Stream of the live connection, or of the last one after a disconnect
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    pub fn connection_id(&self) -> Option<Uuid> {
        self.connection_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_feed(&self) -> bool {
        self.feed.is_some()
    }

    /// Calculate the connection duration
    pub fn connection_duration(&self) -> Option<Duration> {
        self.connected_at.map(|at| at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> EventSink {
        EventSink::new(|_| true)
    }

    #[test]
    fn test_starts_disconnected() {
        let state = ConnectionState::new();
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
        assert!(state.stream_id().is_none());
        assert!(!state.is_current(0));
    }

    #[test]
    fn test_teardown_yields_feed_once() {
        let mut state = ConnectionState::new();
        assert!(state.establish("42", 1, sink()).is_none());
        assert!(state.attach_feed(1, FeedHandle::idle()).is_none());
        assert!(state.has_feed());

        assert!(state.teardown().is_some());
        assert!(state.teardown().is_none());
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_establish_returns_previous_feed() {
        let mut state = ConnectionState::new();
        state.establish("a", 1, sink());
        state.attach_feed(1, FeedHandle::idle());

        let first_id = state.connection_id();
        assert!(first_id.is_some());

        let previous = state.establish("b", 2, sink());
        assert!(previous.is_some());
        assert!(state.is_connected_to("b"));
        assert!(!state.has_feed());
        assert_eq!(state.epoch(), 2);
        assert_ne!(state.connection_id(), first_id);

        state.teardown();
        assert!(state.connection_id().is_none());
        assert_eq!(state.stream_id(), Some("b"));
    }

    #[test]
    fn test_stale_feed_is_rejected() {
        let mut state = ConnectionState::new();
        state.establish("a", 1, sink());
        state.establish("b", 2, sink());

        assert!(state.attach_feed(1, FeedHandle::idle()).is_some());
        assert!(state.attach_feed(2, FeedHandle::idle()).is_none());
        assert!(state.attach_feed(2, FeedHandle::idle()).is_some());
    }

    #[test]
    fn test_send_requires_connection() {
        use crate::core::message::{ChatUser, UserRole};

        let state = ConnectionState::new();
        let user = ChatUser::new(2, "viewer123", UserRole::Viewer, "avatar");
        assert!(!state.send(&ChatMessage::new(user, "hi"), Duration::from_millis(100)));
    }
}
