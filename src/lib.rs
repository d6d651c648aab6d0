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

//! Distributed mutual exclusion over a shared key-value store.
//!
//! A lock is held while a record exists under `prefix|lock|<resource>` in the
//! store. [`locking::LockCoordinator`] claims it with an atomic
//! create-if-absent, retrying with jittered exponential backoff, and removes
//! it on release. Records carry a time-to-live so a crashed holder cannot
//! block other callers forever.

pub mod commands;
pub mod config;
pub mod error;
pub mod locking;
pub mod logging;
pub mod store;
