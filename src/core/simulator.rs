//! Synthetic chat feed
//!
//! Stands in for a backend push transport: while running it emits one random
//! chat message per interval into the connection's sink.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::constants::{SIMULATED_AVATAR_BASE, SIMULATED_ID_RANGE, SIMULATED_STREAMER_PROBABILITY};
use crate::core::feed::{EventSink, FeedHandle, FeedSource};
use crate::core::message::{ChatEvent, ChatMessage, ChatUser, UserRole};
use crate::error::Result;

pub const FILLER_PHRASES: [&str; 10] = [
    "Great stream!",
    "Hello everyone!",
    "This is awesome!",
    "Keep it up!",
    "Nice gameplay!",
    "How long have you been streaming?",
    "What's your setup?",
    "Can you play this game next?",
    "First time watching, loving it!",
    "Subscribed!",
];

/// Endless sequence of random chat messages
pub struct SyntheticMessages<R> {
    rng: R,
}

impl SyntheticMessages<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SyntheticMessages<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn random_user(&mut self) -> ChatUser {
        let role = if self.rng.gen_bool(SIMULATED_STREAMER_PROBABILITY) {
            UserRole::Streamer
        } else {
            UserRole::Viewer
        };

        ChatUser {
            id: self.rng.gen_range(0..SIMULATED_ID_RANGE),
            username: format!("user{}", self.rng.gen_range(0..SIMULATED_ID_RANGE)),
            role,
            avatar: format!("{}{}", SIMULATED_AVATAR_BASE, self.rng.gen::<u64>()),
        }
    }
}

impl<R: Rng> Iterator for SyntheticMessages<R> {
    type Item = ChatMessage;

    fn next(&mut self) -> Option<ChatMessage> {
        let user = self.random_user();
        let text = FILLER_PHRASES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(FILLER_PHRASES[0]);
        Some(ChatMessage::new(user, text))
    }
}

/// Periodic synthetic feed
pub struct MessageFeedSimulator {
    interval: Duration,
}

impl MessageFeedSimulator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FeedSource for MessageFeedSimulator {
    fn start(&self, stream_id: &str, sink: EventSink) -> Result<FeedHandle> {
        let interval = self.interval();
        let stream_id = stream_id.to_string();

        info!(
            "Starting simulated feed for stream {} every {:?}",
            stream_id, interval
        );

        FeedHandle::spawn(async move {
            let mut messages = SyntheticMessages::from_entropy();
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(message) = messages.next() else {
                    break;
                };

                if !sink.deliver(ChatEvent::Chat(message)) {
                    debug!("Simulated feed for stream {} no longer current", stream_id);
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_synthetic_messages_shape() {
        let messages = SyntheticMessages::new(StdRng::seed_from_u64(42));

        for message in messages.take(200) {
            assert!(message.user.id < SIMULATED_ID_RANGE);
            assert!(message.user.username.starts_with("user"));
            assert!(message.user.avatar.starts_with(SIMULATED_AVATAR_BASE));
            assert!(FILLER_PHRASES.contains(&message.text.as_str()));
        }
    }

    #[test]
    fn test_role_mostly_viewer() {
        let messages = SyntheticMessages::new(StdRng::seed_from_u64(7));
        let streamers = messages
            .take(2000)
            .filter(|m| m.user.role == UserRole::Streamer)
            .count();

        // Expected around 200
        assert!(streamers > 100 && streamers < 320, "streamers = {}", streamers);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_interval() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sink = EventSink::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let simulator = MessageFeedSimulator::new(Duration::from_millis(5000));
        assert_eq!(simulator.interval(), Duration::from_millis(5000));
        let handle = simulator.start("stream-1", sink).unwrap();

        time::sleep(Duration::from_millis(4999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(10_002)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        simulator.stop(handle);
        time::sleep(Duration::from_millis(20_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_sink_rejects() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sink = EventSink::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        });

        let handle = MessageFeedSimulator::new(Duration::from_millis(100))
            .start("stream-1", sink)
            .unwrap();

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }
}
