//! Live Chat - per-stream chat delivery for a live-streaming client
//!
//! This library provides the chat channel service: one connection per
//! stream, fan-out of inbound events to registered handlers, send loop-back
//! and a simulated push feed.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod storage;

// Re-export main components
pub use config::*;
pub use constants::*;
