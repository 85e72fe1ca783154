//! Per-account dedup state and cycle timing.
//!
//! A uid is admitted at most once per cycle: it must be absent from
//! `seen_uids` and above the watermark. Once the cycle interval has elapsed
//! the state is reset to empty/zero and a new cycle starts.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CycleState {
    seen_uids: HashSet<u32>,
    last_seen_uid: u32,
    last_cycle_time: DateTime<Utc>,
    cycle_interval: Duration,
}

impl CycleState {
    pub fn new(cycle_interval: Duration, now: DateTime<Utc>) -> Self {
        Self {
            seen_uids: HashSet::new(),
            last_seen_uid: 0,
            last_cycle_time: now,
            cycle_interval,
        }
    }

    /// `now - last_cycle_time >= cycle_interval`. A clock that went
    /// backwards never expires the cycle.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.last_cycle_time)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.cycle_interval)
    }

    /// Start a new cycle at `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.seen_uids.clear();
        self.last_seen_uid = 0;
        self.last_cycle_time = now;
    }

    /// Whether `uid` is new relative to the seen set and `watermark`.
    ///
    /// The watermark is passed in so a poll can judge every message against
    /// the value it had when the poll began.
    pub fn admits(&self, uid: u32, watermark: u32) -> bool {
        !self.seen_uids.contains(&uid) && uid > watermark
    }

    /// Record `uid` as processed and advance the watermark if it is larger.
    pub fn mark_seen(&mut self, uid: u32) {
        self.seen_uids.insert(uid);
        self.last_seen_uid = self.last_seen_uid.max(uid);
    }

    /// Time left until the cycle expires (zero once expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = (now - self.last_cycle_time).to_std().unwrap_or_default();
        self.cycle_interval.saturating_sub(elapsed)
    }

    pub fn last_seen_uid(&self) -> u32 {
        self.last_seen_uid
    }

    pub fn seen_count(&self) -> usize {
        self.seen_uids.len()
    }

    pub fn last_cycle_time(&self) -> DateTime<Utc> {
        self.last_cycle_time
    }

    pub fn cycle_interval(&self) -> Duration {
        self.cycle_interval
    }
}
