//! Durable shared counters.
//!
//! [`OrbitCounterStore`] serializes increments with a non-blocking flag:
//! while one increment is in flight every other one is turned away with
//! [`IncrementError::Busy`] instead of waiting. Clients are expected to retry.
//!
//! A failed write does not roll the in-memory value back. The next
//! successful write persists the newer value, so the file lags by at most the
//! increments since the last good write.

use nullism_core::pick_celebration;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

use crate::error::Error;
use crate::storage::ScalarFile;

/// Why an increment did not go through cleanly.
#[derive(Debug, Error)]
pub enum IncrementError {
    /// Another increment holds the update flag.
    #[error("update in progress, please try again")]
    Busy,

    /// The counter is already at `u64::MAX`.
    #[error("orbit counter is at its maximum value {orbits}")]
    Exhausted { orbits: u64 },

    /// The counter advanced in memory but could not be written.
    #[error("failed to persist counter value {orbits}: {source}")]
    Persist {
        orbits: u64,
        #[source]
        source: Error,
    },
}

/// A successful increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub orbits: u64,
    pub message: &'static str,
}

/// Clears the update flag when dropped.
#[derive(Debug)]
pub(crate) struct UpdateGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Global orbit counter backed by a [`ScalarFile`].
#[derive(Debug)]
pub struct OrbitCounterStore {
    orbits: AtomicU64,
    updating: AtomicBool,
    file: ScalarFile,
}

impl OrbitCounterStore {
    /// Open the counter, applying an operator override if given.
    pub async fn open(file: ScalarFile, initial_override: Option<u64>) -> Self {
        let orbits = file.initialize(initial_override).await;
        Self {
            orbits: AtomicU64::new(orbits),
            updating: AtomicBool::new(false),
            file,
        }
    }

    /// Current value. Never fails.
    pub fn read(&self) -> u64 {
        self.orbits.load(Ordering::Acquire)
    }

    /// Add one orbit, persist it, and pick a celebration line.
    pub async fn increment(&self) -> Result<Increment, IncrementError> {
        let guard = self.begin_update()?;
        self.increment_holding(guard).await
    }

    /// Increment while already holding the update flag.
    pub(crate) async fn increment_holding(
        &self,
        _guard: UpdateGuard<'_>,
    ) -> Result<Increment, IncrementError> {
        let orbits = self
            .orbits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|orbits| IncrementError::Exhausted { orbits })?;
        if let Err(source) = self.file.store(orbits).await {
            tracing::error!(orbits, "Error writing counter: {}", source);
            return Err(IncrementError::Persist { orbits, source });
        }

        let message = pick_celebration(&mut rand::thread_rng());
        tracing::debug!(orbits, "orbit counter incremented");
        Ok(Increment { orbits, message })
    }

    /// Take the update flag, or fail with `Busy` if it is already held.
    pub(crate) fn begin_update(&self) -> Result<UpdateGuard<'_>, IncrementError> {
        self.updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| UpdateGuard {
                flag: &self.updating,
            })
            .map_err(|_| IncrementError::Busy)
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }
}

/// Total connection counter backed by a [`ScalarFile`].
///
/// Only the roster touches it, from under its own lock, so increments need
/// no flag of their own.
#[derive(Debug)]
pub struct VisitCounter {
    visits: AtomicU64,
    file: ScalarFile,
}

impl VisitCounter {
    /// Open the counter, applying an operator override if given.
    pub async fn open(file: ScalarFile, initial_override: Option<u64>) -> Self {
        let visits = file.initialize(initial_override).await;
        Self {
            visits: AtomicU64::new(visits),
            file,
        }
    }

    pub fn read(&self) -> u64 {
        self.visits.load(Ordering::Acquire)
    }

    /// Count one visit and persist it. Write failures are logged only.
    ///
    /// Saturates at `u64::MAX`.
    pub async fn record_visit(&self) -> u64 {
        let visits = match self
            .visits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1))
        {
            Ok(previous) => previous + 1,
            Err(visits) => {
                tracing::warn!(visits, "Total visits at maximum, not counting");
                return visits;
            }
        };
        if let Err(e) = self.file.store(visits).await {
            tracing::error!(visits, "Error writing total visits: {}", e);
        }
        visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nullism_core::CELEBRATIONS;
    use std::sync::Arc;
    use tempfile::tempdir;

    async fn store_in(dir: &std::path::Path) -> OrbitCounterStore {
        OrbitCounterStore::open(ScalarFile::new(dir.join(".orbit_counter")), None).await
    }

    #[tokio::test]
    async fn increment_persists_and_celebrates() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let first = store.increment().await.unwrap();
        assert_eq!(first.orbits, 1);
        assert!(CELEBRATIONS.contains(&first.message));
        assert_eq!(store.read(), 1);
        assert!(!store.is_updating());

        let file = ScalarFile::new(dir.path().join(".orbit_counter"));
        assert_eq!(file.load().await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn restart_reads_last_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".orbit_counter");
        {
            let store = OrbitCounterStore::open(ScalarFile::new(&path), Some(41)).await;
            store.increment().await.unwrap();
        }

        let reopened = OrbitCounterStore::open(ScalarFile::new(&path), None).await;
        assert_eq!(reopened.read(), 42);
    }

    #[tokio::test]
    async fn override_replaces_stored_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".orbit_counter");
        ScalarFile::new(&path).store(900).await.unwrap();

        let store = OrbitCounterStore::open(ScalarFile::new(&path), Some(5)).await;
        assert_eq!(store.read(), 5);
        assert_eq!(ScalarFile::new(&path).load().await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn increment_while_updating_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;
        store.increment().await.unwrap();

        let guard = store.begin_update().unwrap();
        assert!(matches!(store.increment().await, Err(IncrementError::Busy)));
        assert!(matches!(store.begin_update(), Err(IncrementError::Busy)));
        assert_eq!(store.read(), 1);
        drop(guard);

        assert_eq!(store.increment().await.unwrap().orbits, 2);
    }

    #[tokio::test]
    async fn two_contenders_exactly_one_wins() {
        let dir = tempdir().unwrap();
        let store = OrbitCounterStore::open(
            ScalarFile::new(dir.path().join(".orbit_counter")),
            Some(7),
        )
        .await;

        // First contender holds the flag while the second arrives
        let first = store.begin_update().unwrap();
        let second = store.increment().await;
        let first = store.increment_holding(first).await;

        assert!(matches!(second, Err(IncrementError::Busy)));
        assert_eq!(first.unwrap().orbits, 8);
        assert_eq!(store.read(), 8);

        let file = ScalarFile::new(dir.path().join(".orbit_counter"));
        assert_eq!(file.load().await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn joined_increments_stay_consistent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let (a, b) = tokio::join!(store.increment(), store.increment());
        let succeeded = [&a, &b].iter().filter(|r| r.is_ok()).count() as u64;
        let busy = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(IncrementError::Busy)))
            .count() as u64;

        assert!(succeeded >= 1);
        assert_eq!(succeeded + busy, 2);
        assert_eq!(store.read(), succeeded);

        let file = ScalarFile::new(dir.path().join(".orbit_counter"));
        assert_eq!(file.load().await.unwrap(), Some(succeeded));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn contention_from_many_tasks() {
        let dir = tempdir().unwrap();
        let store = Arc::new(store_in(dir.path()).await);
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    store.increment().await
                })
            })
            .collect();

        let mut succeeded = 0u64;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(IncrementError::Busy) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert!(succeeded >= 1);
        assert_eq!(store.read(), succeeded);
        assert!(!store.is_updating());
    }

    #[tokio::test]
    async fn persist_failure_keeps_memory_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(".orbit_counter");
        let store = OrbitCounterStore::open(ScalarFile::new(&path), Some(10)).await;
        assert_eq!(store.read(), 10);

        match store.increment().await {
            Err(IncrementError::Persist { orbits, .. }) => assert_eq!(orbits, 11),
            other => panic!("expected persist failure, got {other:?}"),
        }
        assert_eq!(store.read(), 11);
        assert!(!store.is_updating());
    }

    #[tokio::test]
    async fn increment_at_maximum_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".orbit_counter");
        let store = OrbitCounterStore::open(ScalarFile::new(&path), Some(u64::MAX)).await;

        match store.increment().await {
            Err(IncrementError::Exhausted { orbits }) => assert_eq!(orbits, u64::MAX),
            other => panic!("expected exhausted counter, got {other:?}"),
        }
        assert_eq!(store.read(), u64::MAX);
        assert!(!store.is_updating());
        assert_eq!(ScalarFile::new(&path).load().await.unwrap(), Some(u64::MAX));
    }

    #[tokio::test]
    async fn visits_saturate_at_maximum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".total_visits");
        let visits = VisitCounter::open(ScalarFile::new(&path), Some(u64::MAX)).await;

        assert_eq!(visits.record_visit().await, u64::MAX);
        assert_eq!(visits.read(), u64::MAX);
        assert_eq!(ScalarFile::new(&path).load().await.unwrap(), Some(u64::MAX));
    }

    #[tokio::test]
    async fn visits_count_and_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".total_visits");
        let visits = VisitCounter::open(ScalarFile::new(&path), None).await;

        assert_eq!(visits.record_visit().await, 1);
        assert_eq!(visits.record_visit().await, 2);
        assert_eq!(ScalarFile::new(&path).load().await.unwrap(), Some(2));

        let reopened = VisitCounter::open(ScalarFile::new(&path), None).await;
        assert_eq!(reopened.read(), 2);
    }
}
