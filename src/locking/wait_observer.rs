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

//! Observer interfaces for lock wait instrumentation.
//!
//! Observers decouple the `LockCoordinator` from user-facing feedback so
//! callers can surface contention without duplicating the retry loop.

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Observer hooks for lock wait events.
pub trait LockWaitObserver: Send + Sync {
    /// Attempt `attempt` failed and the coordinator is about to sleep `delay`.
    fn on_retry(&self, _key: &str, _attempt: u32, _delay: Duration) {}

    fn on_acquired(&self, _key: &str, _attempts: u32, _waited: Duration) {}

    /// Retries or the deadline ran out.
    fn on_exhausted(&self, _key: &str, _attempts: u32, _waited: Duration) {}
}

/// Observer implementation that performs no work.
#[derive(Debug, Default)]
pub struct NoopLockWaitObserver;

impl LockWaitObserver for NoopLockWaitObserver {}

/// Writes a single waiting notice and the final outcome to a writer,
/// typically stderr.
pub struct StatusLineObserver<W: Write + Send> {
    out: Mutex<StatusState<W>>,
}

struct StatusState<W> {
    writer: W,
    announced: bool,
}

impl StatusLineObserver<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> StatusLineObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: Mutex::new(StatusState {
                writer,
                announced: false,
            }),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(state) => state.writer,
            Err(poisoned) => poisoned.into_inner().writer,
        }
    }

    fn emit(&self, message: &str, only_after_announce: bool, announce: bool) {
        let Ok(mut state) = self.out.lock() else {
            return;
        };
        if only_after_announce && !state.announced {
            return;
        }
        if announce {
            if state.announced {
                return;
            }
            state.announced = true;
        }
        let _ = writeln!(state.writer, "{message}");
    }
}

impl<W: Write + Send> LockWaitObserver for StatusLineObserver<W> {
    fn on_retry(&self, key: &str, _attempt: u32, _delay: Duration) {
        self.emit(&format!("Waiting for lock on {key}..."), false, true);
    }

    fn on_acquired(&self, key: &str, attempts: u32, waited: Duration) {
        self.emit(
            &format!(
                "Lock on {key} acquired after {attempts} attempt(s) ({:.3}s).",
                waited.as_secs_f64()
            ),
            true,
            false,
        );
    }

    fn on_exhausted(&self, key: &str, attempts: u32, waited: Duration) {
        self.emit(
            &format!(
                "Gave up waiting for lock on {key} after {attempts} attempt(s) ({:.3}s).",
                waited.as_secs_f64()
            ),
            false,
            false,
        );
    }
}
