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

use std::fmt;

/// Literal segment marking a store key as a lock record.
pub const LOCK_TAG: &str = "lock";
pub const KEY_SEPARATOR: char = '|';

/// Store key holding the lock record for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey(String);

impl LockKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LockKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds `prefix|lock|resource`, or `lock|resource` without a prefix.
pub fn lock_key<R: fmt::Display + ?Sized>(prefix: Option<&str>, resource: &R) -> LockKey {
    let key = match prefix {
        Some(prefix) => format!("{prefix}{KEY_SEPARATOR}{LOCK_TAG}{KEY_SEPARATOR}{resource}"),
        None => format!("{LOCK_TAG}{KEY_SEPARATOR}{resource}"),
    };
    LockKey(key)
}
