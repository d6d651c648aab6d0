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

use crate::config::{RemoteLockConfig, StoreBackend};
use crate::error::{RemoteLockError, Result};
use crate::store::FileStore;
use log::info;

pub struct PurgeCommand<'a> {
    config: &'a RemoteLockConfig,
}

impl<'a> PurgeCommand<'a> {
    pub fn new(config: &'a RemoteLockConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn execute(&self) -> Result<()> {
        if self.config.store.backend != StoreBackend::File {
            return Err(RemoteLockError::InvalidConfig(
                "purge only applies to the file store backend".to_string(),
            ));
        }

        let directory = self.config.store_directory();
        info!("Purging expired lock records in {}", directory.display());
        let store = FileStore::open(&directory)?;
        let report = store.purge_expired()?;

        println!(
            "Removed {} expired record(s) and {} stale temporary file(s) in {:.3}s",
            report.removed_records,
            report.removed_staging,
            report.duration.as_secs_f64()
        );
        if report.errors > 0 {
            eprintln!(
                "{} file(s) could not be inspected or removed",
                report.errors
            );
        }
        Ok(())
    }
}
