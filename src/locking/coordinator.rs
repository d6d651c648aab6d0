// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::RemoteLockConfig;
use crate::error::{RemoteLockError, Result};
use crate::locking::backoff::{JitterSource, Sleeper, ThreadRngJitter, ThreadSleeper, backoff_delay};
use crate::locking::guard::LockGuard;
use crate::locking::key::{LockKey, lock_key};
use crate::locking::options::{AcquireOptions, AcquireSettings};
use crate::locking::wait_observer::{LockWaitObserver, NoopLockWaitObserver};
use crate::store::{StoreAdapter, open_adapter};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Coordinates lock ownership through a shared store.
///
/// The coordinator keeps no record of what it holds: every answer comes from
/// the store, so any number of coordinators, in this process or others, can
/// contend for the same keys.
pub struct LockCoordinator {
    adapter: Arc<dyn StoreAdapter>,
    prefix: Option<String>,
    defaults: AcquireSettings,
    jitter: Arc<dyn JitterSource>,
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn LockWaitObserver>,
}

impl LockCoordinator {
    /// Creates a coordinator over `adapter`, rejecting adapters whose
    /// capability check fails before any lock traffic is sent.
    pub fn new(adapter: Arc<dyn StoreAdapter>, prefix: Option<String>) -> Result<Self> {
        adapter
            .check()
            .map_err(|err| RemoteLockError::InvalidAdapter(err.to_string()))?;

        Ok(Self {
            adapter,
            prefix,
            defaults: AcquireSettings::default(),
            jitter: Arc::new(ThreadRngJitter),
            sleeper: Arc::new(ThreadSleeper),
            observer: Arc::new(NoopLockWaitObserver),
        })
    }

    /// Builds a coordinator from the store, prefix and defaults in `config`.
    pub fn from_config(config: &RemoteLockConfig) -> Result<Self> {
        let adapter = open_adapter(&config.store, config.home())?;
        let defaults = config.lock.settings()?;
        Ok(Self::new(adapter, config.prefix.clone())?.with_defaults(defaults))
    }

    pub fn with_defaults(mut self, defaults: AcquireSettings) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LockWaitObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn defaults(&self) -> &AcquireSettings {
        &self.defaults
    }

    pub fn key_for<R: fmt::Display + ?Sized>(&self, resource: &R) -> LockKey {
        lock_key(self.prefix.as_deref(), resource)
    }

    /// Blocks until the lock for `resource` is claimed, the retry budget is
    /// spent, or the deadline passes.
    pub fn acquire<R: fmt::Display + ?Sized>(
        &self,
        resource: &R,
        options: &AcquireOptions,
    ) -> Result<()> {
        let key = self.key_for(resource);
        self.acquire_key(&key, &options.resolve(&self.defaults))
    }

    /// Like [`acquire`](Self::acquire), returning a guard that releases the
    /// lock when dropped.
    pub fn acquire_guard<R: fmt::Display + ?Sized>(
        &self,
        resource: &R,
        options: &AcquireOptions,
    ) -> Result<LockGuard<'_>> {
        let key = self.key_for(resource);
        self.acquire_key(&key, &options.resolve(&self.defaults))?;
        Ok(LockGuard::new(self, key))
    }

    /// Deletes the lock record. Releasing an absent lock is not an error.
    pub fn release<R: fmt::Display + ?Sized>(&self, resource: &R) -> Result<()> {
        self.release_key(&self.key_for(resource))
    }

    /// Point-in-time view of whether anyone holds the lock.
    pub fn is_acquired<R: fmt::Display + ?Sized>(&self, resource: &R) -> Result<bool> {
        self.key_present(&self.key_for(resource))
    }

    /// Runs `action` while holding the lock for `resource`.
    ///
    /// When the lock is already present the action runs directly and nothing
    /// is released afterwards. This lets nested calls from the holder proceed,
    /// but it cannot tell the holder apart from any other process currently
    /// holding the same key.
    ///
    /// Otherwise the lock is acquired first (the action never runs if that
    /// fails) and released exactly once afterwards, including when the action
    /// fails or panics. An action error takes precedence over a release error.
    pub fn with_lock<R, T, E, F>(
        &self,
        resource: &R,
        options: &AcquireOptions,
        action: F,
    ) -> std::result::Result<T, E>
    where
        R: fmt::Display + ?Sized,
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<RemoteLockError>,
    {
        let key = self.key_for(resource);
        if self.key_present(&key)? {
            debug!("Lock {key} already present; running without re-acquiring");
            return action();
        }

        self.acquire_key(&key, &options.resolve(&self.defaults))?;
        let guard = LockGuard::new(self, key);
        match action() {
            Ok(value) => {
                guard.release()?;
                Ok(value)
            }
            Err(err) => {
                let label = guard.key().to_string();
                if let Err(release_err) = guard.release() {
                    warn!("Failed to release lock {label} after failed action: {release_err}");
                }
                Err(err)
            }
        }
    }

    pub(crate) fn release_key(&self, key: &LockKey) -> Result<()> {
        self.adapter.delete(key.as_str())?;
        debug!("Released lock {key}");
        Ok(())
    }

    fn key_present(&self, key: &LockKey) -> Result<bool> {
        Ok(self.adapter.has_key(key.as_str())?)
    }

    fn acquire_key(&self, key: &LockKey, settings: &AcquireSettings) -> Result<()> {
        let started_at = Instant::now();
        // A deadline beyond Instant's range never fires.
        let timeout_at = started_at.checked_add(settings.timeout);
        let max_attempts = settings.max_attempts();
        let mut attempt: u32 = 1;

        loop {
            if self.adapter.store(key.as_str(), settings.expiry)? {
                let waited = started_at.elapsed();
                if attempt > 1 {
                    info!(
                        "Acquired lock {key} on attempt {attempt} after {:.3}s",
                        waited.as_secs_f64()
                    );
                } else {
                    debug!("Acquired lock {key}");
                }
                self.observer.on_acquired(key.as_str(), attempt, waited);
                return Ok(());
            }

            if attempt >= max_attempts {
                debug!("Lock {key} still held after {attempt} attempt(s); retries exhausted");
                break;
            }

            if timeout_at.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("Lock {key} still held after {attempt} attempt(s); timeout reached");
                break;
            }

            let delay = settings.wait_time.unwrap_or_else(|| {
                backoff_delay(attempt, self.jitter.sample(), settings.initial_wait)
            });
            debug!(
                "Lock {key} busy (attempt {attempt}/{max_attempts}); retrying in {:.3}s",
                delay.as_secs_f64()
            );
            self.observer.on_retry(key.as_str(), attempt, delay);
            self.sleeper.sleep(delay);
            attempt += 1;
        }

        let waited = started_at.elapsed();
        self.observer.on_exhausted(key.as_str(), attempt, waited);
        Err(RemoteLockError::LockAcquisitionFailed {
            key: key.to_string(),
            attempts: attempt,
            waited_secs: waited.as_secs_f64(),
        })
    }
}
