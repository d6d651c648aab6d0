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

use crate::error::{RemoteLockError, StoreError};
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a RemoteLockError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a RemoteLockError) -> Self {
        let (suggestion, details) = match error {
            RemoteLockError::LockAcquisitionFailed {
                attempts,
                waited_secs,
                ..
            } => {
                let suggestion = Some(
                    "Another process holds this lock. Try again later, or raise --timeout / \
                     --retries to wait longer."
                        .to_string(),
                );
                let details = Some(format!(
                    "Gave up after {attempts} attempt(s) over {waited_secs:.3}s."
                ));
                (suggestion, details)
            }
            RemoteLockError::InvalidAdapter(msg) => {
                let suggestion = Some(
                    "Check the [store] section of config.toml: 'backend' must be 'file' or \
                     'memory' and 'directory' must point to a writable directory."
                        .to_string(),
                );
                let details = Some(format!("Adapter rejected: {msg}"));
                (suggestion, details)
            }
            RemoteLockError::ConfigError(msg) | RemoteLockError::InvalidConfig(msg) => {
                let suggestion = Some(
                    "Fix config.toml or the REMOTE_LOCK_* environment variables and try again."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            RemoteLockError::Store(store_err) => {
                let suggestion = match store_err {
                    StoreError::Corrupt { path, .. } => Some(format!(
                        "Remove the damaged record manually if no process holds it: {}",
                        path.display()
                    )),
                    StoreError::Io(io_err)
                        if io_err.kind() == std::io::ErrorKind::PermissionDenied =>
                    {
                        Some("Ensure you have write permissions to the store directory.".to_string())
                    }
                    StoreError::Unavailable(_) | StoreError::Backend(_) => Some(
                        "The lock store could not be reached. Check its availability and retry."
                            .to_string(),
                    ),
                    _ => None,
                };
                let details = Some(format!("Store error: {store_err}"));
                (suggestion, details)
            }
            RemoteLockError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        if cfg!(unix) {
                            Some("Check file permissions and try again.".to_string())
                        } else {
                            Some("Run as Administrator or check file permissions.".to_string())
                        }
                    }
                    std::io::ErrorKind::NotFound => Some(
                        "Ensure the program or path exists and is spelled correctly.".to_string(),
                    ),
                    _ => None,
                };
                let details = Some(format!("I/O error: {io_err}"));
                (suggestion, details)
            }
            RemoteLockError::Json(_) => (None, None),
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
