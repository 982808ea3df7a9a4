//! Core functionality for the chat channel

pub mod connection;
pub mod feed;
pub mod message;
pub mod service;
pub mod simulator;
pub mod subscribers;
pub mod view;

// Re-export main components for convenience
pub use connection::{ConnectionState, ConnectionStatus};
pub use feed::{EventSink, FeedHandle, FeedSource, SilentFeed};
pub use message::{ChatEvent, ChatMessage, ChatUser, MessageId, UserRole};
pub use service::ChatChannelService;
pub use simulator::{MessageFeedSimulator, SyntheticMessages};
pub use subscribers::{MessageHandler, SubscriberRegistry};
pub use view::{can_moderate, format_relative_age, ChatView};
