use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One lock per calendar date: computations for the same date run one at a time,
/// computations for different dates do not wait on each other.
#[derive(Debug, Default, Clone)]
pub struct DateGuard {
    locks: Arc<DashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        // clone the Arc out so the shard lock is released before awaiting
        let lock = self
            .locks
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds any more.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
