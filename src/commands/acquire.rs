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

use crate::commands::{AcquireArgs, build_coordinator};
use crate::config::RemoteLockConfig;
use crate::error::Result;

pub struct AcquireCommand<'a> {
    config: &'a RemoteLockConfig,
}

impl<'a> AcquireCommand<'a> {
    pub fn new(config: &'a RemoteLockConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Claims the lock and leaves the record in place until `release` or
    /// expiry.
    pub fn execute(&self, key: &str, args: &AcquireArgs) -> Result<()> {
        let options = args.to_options()?;
        let coordinator = build_coordinator(self.config, args.quiet)?;
        coordinator.acquire(key, &options)?;

        if !args.quiet {
            let expiry = options.resolve(coordinator.defaults()).expiry;
            println!(
                "Acquired {} (expires in {}s)",
                coordinator.key_for(key),
                expiry.as_secs_f64()
            );
        }
        Ok(())
    }
}
