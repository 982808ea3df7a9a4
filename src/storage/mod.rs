//! Storage for messages displayed by a chat view

pub mod chat_log;

// Re-export the chat log
pub use chat_log::{create_chat_log, ChatLog, SharedChatLog};
