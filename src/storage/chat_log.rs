//! View-local chat log
//!
//! Keeps displayed messages in arrival order inside a bounded buffer and
//! applies local moderation. Nothing here is persisted or broadcast.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::constants::DEFAULT_MAX_DISPLAYED_MESSAGES;
use crate::core::message::{ChatMessage, MessageId};

/// Arrival-ordered message list with a maximum capacity
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    max_size: usize,
}

impl ChatLog {
    /// Create a chat log with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let max_size = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(max_size.min(DEFAULT_MAX_DISPLAYED_MESSAGES)),
            max_size,
        }
    }

    /// Append a message, evicting the oldest if at capacity
    pub fn push(&mut self, message: ChatMessage) {
        if self.messages.len() >= self.max_size {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Remove the message with `id`; returns whether one was removed
    pub fn delete_message(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Remove every displayed message from `user_id`; returns how many
    pub fn ban_user(&mut self, user_id: u64) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| m.user.id != user_id);
        before - self.messages.len()
    }

    pub fn all_messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

/// Thread-safe wrapper for ChatLog
pub type SharedChatLog = Arc<Mutex<ChatLog>>;

/// Create a new thread-safe chat log with custom capacity
pub fn create_chat_log(capacity: usize) -> SharedChatLog {
    Arc::new(Mutex::new(ChatLog::with_capacity(capacity)))
}
