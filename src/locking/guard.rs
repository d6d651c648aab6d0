use crate::error::Result;
use crate::locking::LockCoordinator;
use crate::locking::key::LockKey;
use log::warn;
use std::fmt;
use std::time::{Duration, Instant};

/// RAII guard that deletes a lock record when dropped.
pub struct LockGuard<'a> {
    coordinator: &'a LockCoordinator,
    key: LockKey,
    released: bool,
    acquired_at: Instant,
}

impl<'a> LockGuard<'a> {
    pub(crate) fn new(coordinator: &'a LockCoordinator, key: LockKey) -> Self {
        Self {
            coordinator,
            key,
            released: false,
            acquired_at: Instant::now(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Releases now, reporting a store failure instead of logging it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.coordinator.release_key(&self.key)
    }
}

impl fmt::Debug for LockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(err) = self.coordinator.release_key(&self.key)
        {
            warn!("Failed to release lock {}: {err}", self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::locking::{AcquireOptions, LockCoordinator};
    use crate::store::{MemoryStore, StoreAdapter};
    use std::sync::Arc;

    fn coordinator(store: &MemoryStore) -> LockCoordinator {
        LockCoordinator::new(Arc::new(store.clone()), None).unwrap()
    }

    #[test]
    fn guard_drop_allows_reacquire() {
        let store = MemoryStore::new();
        let coordinator = coordinator(&store);
        {
            let guard = coordinator
                .acquire_guard("report", &AcquireOptions::new())
                .unwrap();
            assert_eq!(guard.key(), "lock|report");
            assert!(store.has_key("lock|report").unwrap());
        }
        assert!(!store.has_key("lock|report").unwrap());
        let reacquired = coordinator
            .acquire_guard("report", &AcquireOptions::new())
            .unwrap();
        drop(reacquired);
    }

    #[test]
    fn explicit_release_returns_ok() {
        let store = MemoryStore::new();
        let coordinator = coordinator(&store);
        let guard = coordinator
            .acquire_guard("report", &AcquireOptions::new())
            .unwrap();
        guard.release().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn released_guard_does_not_delete_on_drop() {
        let store = MemoryStore::new();
        let coordinator = coordinator(&store);
        let guard = coordinator
            .acquire_guard("report", &AcquireOptions::new())
            .unwrap();
        assert!(guard.held_for() < std::time::Duration::from_secs(60));
        guard.release().unwrap();

        // A new holder's record survives the first guard going away.
        coordinator.acquire("report", &AcquireOptions::new()).unwrap();
        assert!(store.has_key("lock|report").unwrap());
    }
}
