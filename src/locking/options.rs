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

use std::time::Duration;

pub const DEFAULT_INITIAL_WAIT: Duration = Duration::from_millis(10);
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRIES: u32 = 11;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fully resolved parameters for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireSettings {
    /// Scale of the exponential backoff; the first delay falls in
    /// `[initial_wait / 2, initial_wait)`.
    pub initial_wait: Duration,
    /// Time-to-live handed to the store with every attempt.
    pub expiry: Duration,
    /// Upper bound on store attempts. Zero is treated as one.
    pub retries: u32,
    /// Deadline measured from the start of acquisition.
    pub timeout: Duration,
    /// Fixed delay replacing the computed backoff.
    pub wait_time: Option<Duration>,
}

impl AcquireSettings {
    pub fn max_attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            initial_wait: DEFAULT_INITIAL_WAIT,
            expiry: DEFAULT_EXPIRY,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            wait_time: None,
        }
    }
}

/// Per-call overrides layered over the coordinator's defaults.
///
/// Every field left as `None` keeps the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquireOptions {
    pub initial_wait: Option<Duration>,
    pub expiry: Option<Duration>,
    pub retries: Option<u32>,
    pub timeout: Option<Duration>,
    pub wait_time: Option<Duration>,
}

impl AcquireOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_wait(mut self, initial_wait: Duration) -> Self {
        self.initial_wait = Some(initial_wait);
        self
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = Some(wait_time);
        self
    }

    /// Merges these overrides over `base`, field by field.
    pub fn resolve(&self, base: &AcquireSettings) -> AcquireSettings {
        AcquireSettings {
            initial_wait: self.initial_wait.unwrap_or(base.initial_wait),
            expiry: self.expiry.unwrap_or(base.expiry),
            retries: self.retries.unwrap_or(base.retries),
            timeout: self.timeout.unwrap_or(base.timeout),
            wait_time: self.wait_time.or(base.wait_time),
        }
    }
}
