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

pub mod acquire;
pub mod config;
pub mod purge;
pub mod release;
pub mod run;
pub mod status;

use crate::config::{RemoteLockConfig, seconds};
use crate::error::Result;
use crate::locking::{AcquireOptions, LockCoordinator, StatusLineObserver};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

/// Acquisition flags shared by `run` and `acquire`.
#[derive(Args, Debug, Clone, Default)]
pub struct AcquireArgs {
    /// Scale of the exponential backoff between attempts
    #[arg(long, value_name = "SECONDS")]
    pub initial_wait: Option<f64>,

    /// Time-to-live of the lock record
    #[arg(long, value_name = "SECONDS")]
    pub expiry: Option<f64>,

    /// Maximum number of attempts
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Give up after this long
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Fixed delay between attempts instead of exponential backoff
    #[arg(long, value_name = "SECONDS")]
    pub wait_time: Option<f64>,

    /// Don't print waiting progress
    #[arg(short, long)]
    pub quiet: bool,
}

impl AcquireArgs {
    pub fn to_options(&self) -> Result<AcquireOptions> {
        let mut options = AcquireOptions::new();
        if let Some(value) = self.initial_wait {
            options = options.with_initial_wait(seconds("--initial-wait", value)?);
        }
        if let Some(value) = self.expiry {
            options = options.with_expiry(seconds("--expiry", value)?);
        }
        if let Some(retries) = self.retries {
            options = options.with_retries(retries);
        }
        if let Some(value) = self.timeout {
            let timeout = if value.is_finite() && value < 0.0 {
                Duration::ZERO
            } else {
                seconds("--timeout", value)?
            };
            options = options.with_timeout(timeout);
        }
        if let Some(value) = self.wait_time {
            options = options.with_wait_time(seconds("--wait-time", value)?);
        }
        Ok(options)
    }
}

/// Builds a coordinator from the configuration, reporting waits on stderr
/// unless `quiet` is set.
pub fn build_coordinator(config: &RemoteLockConfig, quiet: bool) -> Result<LockCoordinator> {
    let coordinator = LockCoordinator::from_config(config)?;
    if quiet {
        Ok(coordinator)
    } else {
        Ok(coordinator.with_observer(Arc::new(StatusLineObserver::stderr())))
    }
}
