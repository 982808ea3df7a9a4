//! Consumer-side binding of a chat panel to the channel service

use chrono::{DateTime, Utc};
use log::info;
use std::sync::{Arc, MutexGuard};

use crate::core::message::{ChatEvent, ChatMessage, ChatUser, MessageId};
use crate::core::service::ChatChannelService;
use crate::core::subscribers::MessageHandler;
use crate::storage::chat_log::{create_chat_log, ChatLog, SharedChatLog};

/// A mounted chat panel for one stream.
///
/// Attaching connects the service and registers a handler that appends chat
/// events to the view's log. Detaching (or dropping) removes the handler and
/// disconnects the service.
pub struct ChatView {
    service: ChatChannelService,
    stream_id: String,
    current_user: Option<ChatUser>,
    log: SharedChatLog,
    handler: MessageHandler,
    attached: bool,
}

impl ChatView {
    pub fn attach(
        service: &ChatChannelService,
        stream_id: &str,
        current_user: Option<ChatUser>,
    ) -> Self {
        service.connect(stream_id);

        let log = create_chat_log(service.config().max_displayed_messages);
        let sink = Arc::clone(&log);
        let handler: MessageHandler = Arc::new(move |event: &ChatEvent| {
            if let Some(message) = event.as_chat() {
                lock_log(&sink).push(message.clone());
            }
        });
        service.add_message_handler(Arc::clone(&handler));

        Self {
            service: service.clone(),
            stream_id: stream_id.to_string(),
            current_user,
            log,
            handler,
            attached: true,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn current_user(&self) -> Option<&ChatUser> {
        self.current_user.as_ref()
    }

    /// Send `text` as the current user. Anonymous viewers and blank text
    /// send nothing.
    pub fn send(&self, text: &str) -> bool {
        let Some(user) = &self.current_user else {
            return false;
        };
        if text.trim().is_empty() {
            return false;
        }
        self.service.send_message(ChatMessage::new(user.clone(), text))
    }

    /// Displayed messages in arrival order
    pub fn messages(&self) -> Vec<ChatMessage> {
        lock_log(&self.log).all_messages()
    }

    pub fn message_count(&self) -> usize {
        lock_log(&self.log).count()
    }

    /// Remove one message from this view only
    pub fn delete_message(&self, id: MessageId) -> bool {
        lock_log(&self.log).delete_message(id)
    }

    /// Hide every displayed message from `user_id` in this view only.
    /// Later messages from the same user are still shown.
    pub fn ban_user(&self, user_id: u64) -> usize {
        let removed = lock_log(&self.log).ban_user(user_id);
        info!(
            "User {} banned from chat view of stream {} ({} messages hidden)",
            user_id, self.stream_id, removed
        );
        removed
    }

    /// Whether the current user gets moderation controls for `message`
    pub fn can_moderate(&self, message: &ChatMessage) -> bool {
        can_moderate(self.current_user.as_ref(), message)
    }

    /// Unregister from the service and disconnect it
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.service.remove_message_handler(&self.handler);
        self.service.disconnect();
    }
}

impl Drop for ChatView {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock_log(log: &SharedChatLog) -> MutexGuard<'_, ChatLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Streamers may moderate messages other than their own
pub fn can_moderate(viewer: Option<&ChatUser>, message: &ChatMessage) -> bool {
    viewer.map_or(false, |viewer| {
        viewer.is_streamer() && viewer.id != message.user.id
    })
}

/// Short age label for a message timestamp
pub fn format_relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed_ms = (now - timestamp).num_milliseconds();

    if elapsed_ms < 60_000 {
        "just now".to_string()
    } else if elapsed_ms < 3_600_000 {
        format!("{}m ago", elapsed_ms / 60_000)
    } else if elapsed_ms < 86_400_000 {
        format!("{}h ago", elapsed_ms / 3_600_000)
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
