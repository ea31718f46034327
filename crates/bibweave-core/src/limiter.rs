//! Per-source rate limiter.
//!
//! Each source name owns one timing slot. A caller holds the slot's mutex
//! across its sleep, so consecutive calls tagged with the same source are
//! spaced by at least the requested interval no matter which worker issues
//! them, while callers tagged with different sources never block each other.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct RateLimiter {
    slots: Mutex<FxHashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `min_interval` has elapsed since the last paced call for
    /// `source`, then record the current instant as the last call.
    pub fn pace(&self, source: &str, min_interval: Duration) {
        if min_interval.is_zero() {
            return;
        }
        // The outer map lock is held only long enough to clone the slot.
        let slot = {
            let mut slots = self.slots.lock().expect("limiter lock poisoned");
            slots.entry(source.to_string()).or_default().clone()
        };
        let mut last = slot.lock().expect("limiter slot poisoned");
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < min_interval {
                std::thread::sleep(min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}
