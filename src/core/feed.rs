//! Inbound feed abstraction
//!
//! A feed source pushes inbound events into an [`EventSink`] for as long as
//! its [`FeedHandle`] is alive. The synthetic simulator is one source; a real
//! push-transport receiver plugs in through the same trait.

use log::error;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::message::ChatEvent;
use crate::error::{ChatError, Result};

/// Entry point for inbound events of one connection
///
/// `deliver` returns false once the connection the sink was created for is
/// gone; sources should stop producing when that happens.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(ChatEvent) -> bool + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(ChatEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    pub fn deliver(&self, event: ChatEvent) -> bool {
        (self.deliver)(event)
    }
}

/// Resource held by a running feed. Dropping it cancels the feed task.
pub struct FeedHandle {
    id: Uuid,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Run the feed future on the current tokio runtime
    pub fn spawn<F>(future: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| {
            ChatError::ConnectionError(format!("No tokio runtime to run the feed: {}", e))
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            task: Some(runtime.spawn(future)),
        })
    }

    /// Handle for a source with no background task
    pub fn idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            task: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop the feed task
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Capability interface for anything that produces inbound chat events
pub trait FeedSource: Send + Sync {
    /// Begin producing events for `stream_id` into `sink`
    fn start(&self, stream_id: &str, sink: EventSink) -> Result<FeedHandle>;

    /// Release the resource returned by `start`
    fn stop(&self, handle: FeedHandle) {
        handle.cancel();
    }
}

/// Source that never produces anything; used when simulation is disabled
pub struct SilentFeed;

impl FeedSource for SilentFeed {
    fn start(&self, _stream_id: &str, _sink: EventSink) -> Result<FeedHandle> {
        Ok(FeedHandle::idle())
    }
}

/// Spawn a one-off delivery on the current runtime, logging if none is available
pub(crate) fn spawn_detached<F>(future: F) -> bool
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(future);
            true
        }
        Err(e) => {
            error!("Cannot schedule delivery outside a tokio runtime: {}", e);
            false
        }
    }
}
