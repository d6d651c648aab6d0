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

pub mod backoff;
pub mod coordinator;
pub mod guard;
pub mod key;
pub mod options;
pub mod wait_observer;

pub use backoff::{
    FixedJitter, JitterSource, SeededJitter, Sleeper, ThreadRngJitter, ThreadSleeper,
    backoff_delay,
};
pub use coordinator::LockCoordinator;
pub use guard::LockGuard;
pub use key::{KEY_SEPARATOR, LOCK_TAG, LockKey, lock_key};
pub use options::{
    AcquireOptions, AcquireSettings, DEFAULT_EXPIRY, DEFAULT_INITIAL_WAIT, DEFAULT_RETRIES,
    DEFAULT_TIMEOUT,
};
pub use wait_observer::{LockWaitObserver, NoopLockWaitObserver, StatusLineObserver};
