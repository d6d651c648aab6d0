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
use crate::error::Result;
use crate::locking::LockCoordinator;
use serde::Serialize;

#[derive(Serialize)]
struct StatusOutput<'a> {
    resource: &'a str,
    key: String,
    held: bool,
}

pub struct StatusCommand<'a> {
    config: &'a RemoteLockConfig,
}

impl<'a> StatusCommand<'a> {
    pub fn new(config: &'a RemoteLockConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn execute(&self, key: &str, json: bool) -> Result<()> {
        let coordinator = LockCoordinator::from_config(self.config)?;
        let held = coordinator.is_acquired(key)?;

        if json {
            let output = StatusOutput {
                resource: key,
                key: coordinator.key_for(key).into_string(),
                held,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if held {
            println!("held");
        } else {
            println!("free");
        }
        Ok(())
    }
}
