//! Chat channel service that coordinates the connection, the feed and subscribers

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ChatConfig;
use crate::core::connection::{ConnectionState, ConnectionStatus};
use crate::core::feed::{EventSink, FeedHandle, FeedSource, SilentFeed};
use crate::core::message::{ChatEvent, ChatMessage};
use crate::core::simulator::MessageFeedSimulator;
use crate::core::subscribers::{fan_out, MessageHandler, SubscriberRegistry};
use crate::error::Result;

struct ServiceInner {
    config: ChatConfig,
    feed: Arc<dyn FeedSource>,
    connection: Mutex<ConnectionState>,
    subscribers: Mutex<SubscriberRegistry>,
    epochs: AtomicU64,
}

/// Per-stream chat channel.
///
/// One instance holds at most one live connection. Clones share the same
/// state; construct separate instances for independent channels. Every
/// operation that starts timers (`connect`, `send_message`) must run inside a
/// tokio runtime. Call [`ChatChannelService::shutdown`] to tear the channel
/// down explicitly; dropping the last clone also stops the feed.
///
/// On a multi-threaded runtime deliveries from the feed and from send
/// loop-backs run on different tasks and may overlap. Use a current-thread
/// runtime when strictly serialized dispatch is required.
#[derive(Clone)]
pub struct ChatChannelService {
    inner: Arc<ServiceInner>,
}

impl ChatChannelService {
    /// Create a service whose feed follows `config.simulate_feed`
    pub fn new(config: ChatConfig) -> Self {
        let feed: Arc<dyn FeedSource> = if config.simulate_feed {
            Arc::new(MessageFeedSimulator::new(config.feed_interval))
        } else {
            Arc::new(SilentFeed)
        };
        Self::with_feed_source(config, feed)
    }

    /// Create a service with a custom inbound feed
    pub fn with_feed_source(config: ChatConfig, feed: Arc<dyn FeedSource>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                config,
                feed,
                connection: Mutex::new(ConnectionState::new()),
                subscribers: Mutex::new(SubscriberRegistry::new()),
                epochs: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    /// Connect to the chat of `stream_id`, replacing any other connection.
    /// Connecting again to the stream already connected is a no-op.
    pub fn connect(&self, stream_id: &str) {
        let epoch = self.inner.epochs.fetch_add(1, Ordering::SeqCst) + 1;
        let sink = self.inner.sink_for(epoch);

        let previous = {
            let mut connection = self.inner.connection();
            if connection.is_connected_to(stream_id) {
                debug!("Already connected to stream {}", stream_id);
                return;
            }
            connection.establish(stream_id, epoch, sink.clone())
        };

        if let Some(handle) = previous {
            info!("Switching chat connection to stream {}", stream_id);
            self.inner.feed.stop(handle);
        }

        // The source may deliver synchronously, so the connection lock is
        // released while it starts.
        let handle = match self.inner.feed.start(stream_id, sink) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start feed for stream {}: {}", stream_id, e);
                let mut connection = self.inner.connection();
                if connection.is_current(epoch) {
                    connection.teardown();
                }
                return;
            }
        };

        let (rejected, connection_id) = {
            let mut connection = self.inner.connection();
            let rejected = connection.attach_feed(epoch, handle);
            (rejected, connection.connection_id())
        };
        match rejected {
            Some(stale) => {
                debug!("Connection to stream {} closed while its feed started", stream_id);
                self.inner.feed.stop(stale);
            }
            None => info!(
                "Connected to chat for stream {} (connection {:?}, epoch {})",
                stream_id, connection_id, epoch
            ),
        }
    }

    /// Stop the feed and mark the channel disconnected. Subscribers stay registered.
    pub fn disconnect(&self) {
        let (handle, stream_id) = {
            let mut connection = self.inner.connection();
            if !connection.is_connected() {
                return;
            }
            let stream_id = connection.stream_id().map(str::to_string);
            (connection.teardown(), stream_id)
        };

        self.stop_feed(handle);
        info!("Disconnected from chat for stream {:?}", stream_id);
    }

    /// Queue `message` for loop-back to every handler, the sender included.
    ///
    /// Blank text or no live connection drops the message silently; the
    /// return value says whether it was accepted.
    pub fn send_message(&self, message: ChatMessage) -> bool {
        if !message.has_content() {
            debug!("Ignoring chat message {} with empty text", message.id);
            return false;
        }

        let connection = self.inner.connection();
        if !connection.is_connected() {
            debug!("Ignoring chat message {} while disconnected", message.id);
            return false;
        }

        connection.send(&message, self.inner.config.loopback_delay)
    }

    pub fn add_message_handler(&self, handler: MessageHandler) {
        if !self.inner.subscribers().add(handler) {
            debug!("Message handler already registered");
        }
    }

    pub fn remove_message_handler(&self, handler: &MessageHandler) {
        self.inner.subscribers().remove(handler);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.connection().status()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connection().is_connected()
    }

    /// Stream of the live connection
    pub fn stream_id(&self) -> Option<String> {
        let connection = self.inner.connection();
        if connection.is_connected() {
            connection.stream_id().map(str::to_string)
        } else {
            None
        }
    }

    /// Get the current number of registered handlers
    pub fn handler_count(&self) -> Result<usize> {
        let subscribers = self.inner.subscribers.lock()?;
        Ok(subscribers.len())
    }

    /// Disconnect and drop every subscriber
    pub fn shutdown(&self) {
        self.disconnect();
        self.inner.subscribers().clear();
        info!("Chat channel shut down");
    }

    fn stop_feed(&self, handle: Option<FeedHandle>) {
        if let Some(handle) = handle {
            self.inner.feed.stop(handle);
        }
    }
}

impl ServiceInner {
    fn connection(&self) -> MutexGuard<'_, ConnectionState> {
        self.connection.lock().unwrap_or_else(|poisoned| {
            warn!("Connection state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn subscribers(&self) -> MutexGuard<'_, SubscriberRegistry> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            warn!("Subscriber lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Sink bound to one connection epoch. Holds the service weakly so a
    /// running feed does not keep a dropped service alive.
    fn sink_for(self: &Arc<Self>, epoch: u64) -> EventSink {
        let inner = Arc::downgrade(self);
        EventSink::new(move |event| match inner.upgrade() {
            Some(inner) => inner.dispatch(epoch, event),
            None => false,
        })
    }

    /// Deliver `event` to a snapshot of the subscribers if `epoch` is still
    /// the live connection. Handlers run with no lock held.
    fn dispatch(&self, epoch: u64, event: ChatEvent) -> bool {
        let handlers = {
            let connection = self.connection();
            if !connection.is_current(epoch) {
                return false;
            }
            self.subscribers().snapshot()
        };

        let delivered = fan_out(&handlers, &event);
        if delivered < handlers.len() {
            warn!(
                "{} of {} message handlers failed",
                handlers.len() - delivered,
                handlers.len()
            );
        }
        true
    }
}
