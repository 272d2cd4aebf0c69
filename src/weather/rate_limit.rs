//! Sliding-window rate limiting
//!
//! A strict sliding-window counter: admission is denied the instant `limit`
//! requests exist within the trailing window and becomes available again
//! only as old entries age out. Entries older than the window are evicted
//! lazily before each check, so the retained sequence never exceeds `limit`
//! timestamps.
//!
//! An admission is consumed at check time and never refunded: "admitted"
//! means "attempted", whether or not the request it gated succeeds.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    admissions: VecDeque<Instant>,
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            admissions: VecDeque::with_capacity(limit),
        }
    }

    /// Limit per 60-second window, the provider's quota unit.
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Evict admissions older than the window, then admit and record `now`
    /// if fewer than `limit` remain.
    pub fn try_admit(&mut self, now: Instant) -> bool {
        while let Some(oldest) = self.admissions.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }

        if self.admissions.len() < self.limit {
            self.admissions.push_back(now);
            true
        } else {
            false
        }
    }

    /// Admissions currently inside the window.
    pub fn in_flight(&self) -> usize {
        self.admissions.len()
    }
}
