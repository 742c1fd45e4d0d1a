//! Retention policies decide which credential entries `prune` drops.

use std::fmt::Debug;
use std::time::Duration;

use crate::types::StoredCredentials;

pub trait RetentionPolicy: Debug + Send + Sync {
    /// Whether `entry` should be evicted at unix time `now` (seconds).
    fn should_evict(&self, entry: &StoredCredentials, now: u64) -> bool;
}

/// Never evicts. Default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainForever;

impl RetentionPolicy for RetainForever {
    fn should_evict(&self, _entry: &StoredCredentials, _now: u64) -> bool {
        false
    }
}

/// Evicts entries older than the given age.
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub Duration);

impl RetentionPolicy for MaxAge {
    fn should_evict(&self, entry: &StoredCredentials, now: u64) -> bool {
        now.saturating_sub(entry.created_at) >= self.0.as_secs()
    }
}
