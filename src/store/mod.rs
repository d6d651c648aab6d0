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

//! Store adapters backing the lock coordinator.
//!
//! A lock is nothing more than the presence of a key in a shared store. Any
//! client that can atomically create a key with a time-to-live, delete it and
//! test for it can back a [`LockCoordinator`](crate::locking::LockCoordinator).

pub mod file;
pub mod memory;

pub use file::{FileStore, PurgeReport};
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{RemoteLockError, Result, StoreError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Capabilities a key-value client must provide to hold lock records.
#[cfg_attr(test, mockall::automock)]
pub trait StoreAdapter: Send + Sync {
    /// Creates `key` with the given time-to-live only if it is absent.
    ///
    /// Returns `true` when this call created the key and `false` when it
    /// already existed. A failed attempt must leave the existing record and
    /// its expiry untouched.
    fn store(&self, key: &str, expiry: Duration) -> std::result::Result<bool, StoreError>;

    /// Removes `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> std::result::Result<(), StoreError>;

    /// Reports whether `key` is currently present.
    fn has_key(&self, key: &str) -> std::result::Result<bool, StoreError>;

    /// Asserts the adapter is usable before any lock traffic is sent.
    fn check(&self) -> std::result::Result<(), StoreError> {
        Ok(())
    }
}

/// Opens the adapter selected by the `[store]` configuration section.
pub fn open_adapter(config: &StoreConfig, home: &Path) -> Result<Arc<dyn StoreAdapter>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => {
            let directory = config.directory(home);
            let store = FileStore::open(&directory).map_err(|err| {
                RemoteLockError::InvalidAdapter(format!(
                    "file store at {} cannot be opened: {err}",
                    directory.display()
                ))
            })?;
            Ok(Arc::new(store))
        }
    }
}
