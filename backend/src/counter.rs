use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Allocator for globally unique, strictly increasing match ids.
///
/// Seeded at startup with `1 + max(match_id)` from the matches table so ids
/// stay monotone across process restarts.
#[derive(Debug)]
pub struct MatchIdCounter {
    next_val: AtomicI64,
}

impl MatchIdCounter {
    pub fn new(first_val: i64) -> Self {
        Self {
            next_val: AtomicI64::new(first_val),
        }
    }

    pub fn next(&self) -> i64 {
        self.next_val.fetch_add(1, Ordering::Relaxed)
    }
}

/// Wall-clock nanoseconds, used as scrimmage and tournament batch ids.
pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
