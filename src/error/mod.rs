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

mod context;
mod exit_codes;
mod format;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::{format_error_chain, format_error_with_color};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteLockError {
    #[error("Invalid adapter: {0}")]
    InvalidAdapter(String),

    #[error("Couldn't acquire lock for: {key}")]
    LockAcquisitionFailed {
        key: String,
        attempts: u32,
        waited_secs: f64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RemoteLockError {
    /// True when the error reports lock contention rather than a failure of
    /// the store or of the protected operation.
    pub fn is_contention(&self) -> bool {
        matches!(self, RemoteLockError::LockAcquisitionFailed { .. })
    }
}

/// Failures raised by store adapters. The coordinator forwards these to its
/// callers untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Lock record {} is unreadable: {details}", path.display())]
    Corrupt { path: PathBuf, details: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, RemoteLockError>;
