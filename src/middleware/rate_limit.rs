//! Rate limiting middleware
//!
//! Sliding-window limit on how many chat lines one client may send.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Per-session rate limiter. Owned by one session handler, never shared.
pub struct RateLimiter {
    sent: VecDeque<Instant>,
    max_messages: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_messages: usize, window: Duration) -> Self {
        Self {
            sent: VecDeque::with_capacity(max_messages),
            max_messages,
            window,
        }
    }

    pub fn is_allowed(&mut self) -> bool {
        self.is_allowed_at(Instant::now())
    }

    pub fn is_allowed_at(&mut self, now: Instant) -> bool {
        // Remove old messages
        while let Some(&oldest) = self.sent.front() {
            if now.duration_since(oldest) > self.window {
                self.sent.pop_front();
            } else {
                break;
            }
        }

        if self.sent.len() < self.max_messages {
            self.sent.push_back(now);
            true
        } else {
            false
        }
    }
}
