// Timing defaults for the chat channel
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_LOOPBACK_DELAY_MS: u64 = 100;

// View defaults
pub const DEFAULT_MAX_DISPLAYED_MESSAGES: usize = 500;

// Synthetic feed parameters
pub const SIMULATED_ID_RANGE: u64 = 1000;
pub const SIMULATED_STREAMER_PROBABILITY: f64 = 0.1;
pub const SIMULATED_AVATAR_BASE: &str = "https://i.pravatar.cc/150?u=";
