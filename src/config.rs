//! Chat channel configuration module
//! Handles timing and display parameters for the chat channel service

use crate::constants::{
    DEFAULT_FEED_INTERVAL_MS, DEFAULT_LOOPBACK_DELAY_MS, DEFAULT_MAX_DISPLAYED_MESSAGES,
};
use crate::error::{ChatError, Result};
use std::env;
use std::time::Duration;

/// Chat channel configuration parameters
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Interval between synthetic feed messages
    pub feed_interval: Duration,
    /// Delay before a sent message is echoed back to all handlers
    pub loopback_delay: Duration,
    /// Whether connecting starts the synthetic feed
    pub simulate_feed: bool,
    /// Maximum number of messages a chat view keeps on display
    pub max_displayed_messages: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            feed_interval: Duration::from_millis(DEFAULT_FEED_INTERVAL_MS),
            loopback_delay: Duration::from_millis(DEFAULT_LOOPBACK_DELAY_MS),
            simulate_feed: true,
            max_displayed_messages: DEFAULT_MAX_DISPLAYED_MESSAGES,
        }
    }
}

impl ChatConfig {
    /// Override the synthetic feed interval
    pub fn with_feed_interval(mut self, interval: Duration) -> Self {
        self.feed_interval = interval;
        self
    }

    /// Override the send loop-back delay
    pub fn with_loopback_delay(mut self, delay: Duration) -> Self {
        self.loopback_delay = delay;
        self
    }

    /// Check that every value is usable by the service
    pub fn validate(&self) -> Result<()> {
        if self.feed_interval.is_zero() {
            return Err(ChatError::ConfigError(
                "feed interval must be greater than zero".to_string(),
            ));
        }

        if self.max_displayed_messages == 0 {
            return Err(ChatError::ConfigError(
                "max displayed messages must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let feed_ms = env::var("LIVE_CHAT_FEED_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_FEED_INTERVAL_MS);

        let loopback_ms = env::var("LIVE_CHAT_LOOPBACK_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOOPBACK_DELAY_MS);

        let simulate_feed = env::var("LIVE_CHAT_SIMULATE_FEED")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true);

        let max_displayed_messages = env::var("LIVE_CHAT_MAX_DISPLAYED_MESSAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_DISPLAYED_MESSAGES);

        let config = Self {
            feed_interval: Duration::from_millis(feed_ms),
            loopback_delay: Duration::from_millis(loopback_ms),
            simulate_feed,
            max_displayed_messages,
        };

        config.validate()?;
        Ok(config)
    }
}
