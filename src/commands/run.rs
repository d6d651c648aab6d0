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
use crate::error::{RemoteLockError, Result};
use log::{debug, info};
use std::process::{Command, ExitStatus};

pub struct RunCommand<'a> {
    config: &'a RemoteLockConfig,
}

impl<'a> RunCommand<'a> {
    pub fn new(config: &'a RemoteLockConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Runs `program` while holding the lock for `key` and returns the
    /// program's exit code.
    ///
    /// The lock is always acquired here, even if the key is already present:
    /// a fresh process can never be the holder of an existing record.
    pub fn execute(
        &self,
        key: &str,
        args: &AcquireArgs,
        program: &str,
        program_args: &[String],
    ) -> Result<i32> {
        let options = args.to_options()?;
        let coordinator = build_coordinator(self.config, args.quiet)?;

        let guard = coordinator.acquire_guard(key, &options)?;
        info!("Running {program} under lock {}", guard.key());
        // A spawn failure drops the guard, which releases the lock.
        let status = Command::new(program)
            .args(program_args)
            .status()
            .map_err(RemoteLockError::Io)?;
        info!(
            "{program} held lock {} for {:.3}s",
            guard.key(),
            guard.held_for().as_secs_f64()
        );
        guard.release()?;

        let code = exit_code(status);
        debug!("{program} exited with {code}");
        Ok(code)
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
