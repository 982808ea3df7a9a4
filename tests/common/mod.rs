// Shared helpers for chat channel integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use live_chat::config::ChatConfig;
use live_chat::core::{
    ChatEvent, ChatMessage, ChatUser, EventSink, FeedHandle, FeedSource, MessageFeedSimulator,
    MessageHandler, UserRole,
};
use live_chat::error::Result;

pub fn viewer() -> ChatUser {
    ChatUser::new(2, "viewer123", UserRole::Viewer, "https://example.com/viewer.png")
}

pub fn streamer() -> ChatUser {
    ChatUser::new(1, "gamer_pro", UserRole::Streamer, "https://example.com/streamer.png")
}

/// Config with the synthetic feed switched off
pub fn quiet_config() -> ChatConfig {
    ChatConfig {
        simulate_feed: false,
        ..ChatConfig::default()
    }
}

/// Handler that records every chat message it sees
pub fn recorder() -> (MessageHandler, Arc<Mutex<Vec<ChatMessage>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: MessageHandler = Arc::new(move |event: &ChatEvent| {
        if let Some(message) = event.as_chat() {
            sink.lock().unwrap().push(message.clone());
        }
    });
    (handler, seen)
}

pub fn counter() -> (MessageHandler, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    let handler: MessageHandler = Arc::new(move |_: &ChatEvent| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    (handler, count)
}

pub fn texts(seen: &Arc<Mutex<Vec<ChatMessage>>>) -> Vec<String> {
    seen.lock().unwrap().iter().map(|m| m.text.clone()).collect()
}

/// Simulator wrapper that tracks how many feeds are running
pub struct CountingFeed {
    inner: MessageFeedSimulator,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl CountingFeed {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: MessageFeedSimulator::new(interval),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl FeedSource for CountingFeed {
    fn start(&self, stream_id: &str, sink: EventSink) -> Result<FeedHandle> {
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(running, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.inner.start(stream_id, sink)
    }

    fn stop(&self, handle: FeedHandle) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.stop(handle);
    }
}

/// Feed that delivers a fixed list of messages shortly after starting
pub struct ScriptedFeed {
    pub messages: Vec<ChatMessage>,
}

impl FeedSource for ScriptedFeed {
    fn start(&self, _stream_id: &str, sink: EventSink) -> Result<FeedHandle> {
        let messages = self.messages.clone();
        FeedHandle::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            for message in messages {
                if !sink.deliver(ChatEvent::Chat(message)) {
                    break;
                }
            }
        })
    }
}
