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

use crate::error::StoreError;
use crate::store::StoreAdapter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-process store keeping lock records in a shared map.
///
/// Clones share the same map, so coordinators built from clones of one
/// `MemoryStore` contend with each other exactly as separate processes would
/// through a network store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Instant>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records()
            .map(|records| records.values().filter(|expires| **expires > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<String, Instant>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

impl StoreAdapter for MemoryStore {
    fn store(&self, key: &str, expiry: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut records = self.records()?;
        if let Some(expires_at) = records.get(key)
            && *expires_at > now
        {
            return Ok(false);
        }
        // Drop lapsed records of abandoned keys so the map stays bounded by
        // the live set.
        records.retain(|_, expires_at| *expires_at > now);

        // Far-future expiries never lapse.
        let expires_at = now
            .checked_add(expiry)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64));
        records.insert(key.to_string(), expires_at);
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records()?.remove(key);
        Ok(())
    }

    fn has_key(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(self
            .records()?
            .get(key)
            .is_some_and(|expires_at| *expires_at > now))
    }
}
