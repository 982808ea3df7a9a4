//! Subscriber registry for inbound chat events

use log::error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::core::message::ChatEvent;

/// Callback invoked for every dispatched event
pub type MessageHandler = Arc<dyn Fn(&ChatEvent) + Send + Sync>;

/// Set of handlers, unique by pointer identity
#[derive(Default)]
pub struct SubscriberRegistry {
    handlers: Vec<MessageHandler>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; returns false if this exact handler is already present
    pub fn add(&mut self, handler: MessageHandler) -> bool {
        if self.contains(&handler) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    /// Unregister a handler; returns false if it was not registered
    pub fn remove(&mut self, handler: &MessageHandler) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| !same_handler(h, handler));
        self.handlers.len() != before
    }

    pub fn contains(&self, handler: &MessageHandler) -> bool {
        self.handlers.iter().any(|h| same_handler(h, handler))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Stable copy of the current handlers for one dispatch
    pub fn snapshot(&self) -> Vec<MessageHandler> {
        self.handlers.clone()
    }
}

// Compare data pointers only; vtable pointers for the same closure may differ
// across codegen units.
fn same_handler(a: &MessageHandler, b: &MessageHandler) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Deliver one event to every handler, isolating panics per handler.
/// Returns the number of handlers that completed normally.
pub fn fan_out(handlers: &[MessageHandler], event: &ChatEvent) -> usize {
    let mut delivered = 0;

    for handler in handlers {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(()) => delivered += 1,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Message handler panicked during dispatch: {}", reason);
            }
        }
    }

    delivered
}
