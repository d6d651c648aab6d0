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

//! Directory-backed store for processes that share a filesystem.
//!
//! Each lock record is a small JSON file named after the SHA-256 of its key.
//! Creating or replacing a record happens while holding an exclusive advisory
//! lock on the store's guard file, so the "is it free?" check and the write
//! that follows form one step for every contender. Records are written to a
//! staging file and renamed into place, so readers never observe a
//! half-written record and a live record is never moved aside. The operating
//! system drops the advisory lock when its holder exits, crashed or not.

use crate::error::StoreError;
use crate::store::StoreAdapter;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// File suffix of lock records.
pub(crate) const RECORD_SUFFIX: &str = ".lock";
/// Substring used for staging files written before a record is renamed in.
pub(crate) const STAGING_SEGMENT: &str = ".staging-";
/// Advisory lock file serializing record writes within one store directory.
pub(crate) const GUARD_FILE_NAME: &str = ".store.guard";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockRecord {
    key: String,
    pid: u32,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl LockRecord {
    fn new(key: &str, expiry: Duration) -> Self {
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(expiry)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.to_string(),
            pid: std::process::id(),
            created_at,
            expires_at,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Summary of a purge sweep.
#[derive(Debug, Default, Clone)]
pub struct PurgeReport {
    pub removed_records: usize,
    pub removed_staging: usize,
    pub errors: usize,
    pub duration: Duration,
}

/// Exclusive hold on a store directory's guard file.
struct DirectoryGuard {
    file: File,
}

impl Drop for DirectoryGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well.
        let _ = self.file.unlock();
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory when missing.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let store = Self { root };
        store.check()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the record file for `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(format!("{}{RECORD_SUFFIX}", hex::encode(digest)))
    }

    /// Removes expired records and staging files left by crashed writers.
    pub fn purge_expired(&self) -> Result<PurgeReport, StoreError> {
        self.purge_with_now(Utc::now())
    }

    pub(crate) fn purge_with_now(&self, now: DateTime<Utc>) -> Result<PurgeReport, StoreError> {
        let start = Instant::now();
        let mut report = PurgeReport::default();
        // No record can be written while the guard is held, so every staging
        // file found is orphaned and every expired record stays expired.
        let _guard = self.lock_directory()?;

        for entry in fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Failed to read entry in {}: {err}", self.root.display());
                    report.errors += 1;
                    continue;
                }
            };
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };

            if name.contains(STAGING_SEGMENT) {
                match remove_file_if_exists(&path) {
                    Ok(true) => report.removed_staging += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!("Failed to remove staging file {}: {err}", path.display());
                        report.errors += 1;
                    }
                }
                continue;
            }

            if !name.ends_with(RECORD_SUFFIX) {
                continue;
            }

            match read_record(&path) {
                Ok(Some(record)) if record.is_expired(now) => match remove_file_if_exists(&path) {
                    Ok(true) => report.removed_records += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!("Failed to purge record {}: {err}", path.display());
                        report.errors += 1;
                    }
                },
                Ok(_) => {}
                Err(err) => {
                    warn!("Skipping unreadable record {}: {err}", path.display());
                    report.errors += 1;
                }
            }
        }

        report.duration = start.elapsed();
        debug!(
            "Purge of {} removed {} record(s), {} staging file(s) in {:.3}s (errors: {})",
            self.root.display(),
            report.removed_records,
            report.removed_staging,
            report.duration.as_secs_f64(),
            report.errors
        );
        Ok(report)
    }

    /// Blocks until this process holds the directory's write lock.
    fn lock_directory(&self) -> Result<DirectoryGuard, StoreError> {
        let path = self.root.join(GUARD_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.lock() {
            Ok(()) => Ok(DirectoryGuard { file }),
            Err(err) if err.kind() == io::ErrorKind::Unsupported => {
                Err(StoreError::Unavailable(format!(
                    "advisory locks are not supported at {}",
                    path.display()
                )))
            }
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn write_in_place(&self, path: &Path, record: &LockRecord) -> Result<(), StoreError> {
        let staging = append_suffix(path, &format!("{STAGING_SEGMENT}{}", Uuid::new_v4()));
        write_record(&staging, record)?;
        if let Err(err) = fs::rename(&staging, path) {
            cleanup_file(&staging);
            return Err(StoreError::Io(err));
        }
        Ok(())
    }
}

impl StoreAdapter for FileStore {
    fn store(&self, key: &str, expiry: Duration) -> Result<bool, StoreError> {
        let path = self.record_path(key);
        let _guard = self.lock_directory()?;

        if let Some(existing) = read_record(&path)? {
            if !existing.is_expired(Utc::now()) {
                return Ok(false);
            }
            debug!("Replacing expired lock record {}", path.display());
        }

        self.write_in_place(&path, &LockRecord::new(key, expiry))?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        remove_file_if_exists(&self.record_path(key))?;
        Ok(())
    }

    fn has_key(&self, key: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        Ok(read_record(&self.record_path(key))?.is_some_and(|record| !record.is_expired(now)))
    }

    fn check(&self) -> Result<(), StoreError> {
        let metadata = fs::metadata(&self.root)?;
        if !metadata.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(StoreError::Unavailable(format!(
                "{} is read-only",
                self.root.display()
            )));
        }
        self.lock_directory().map(drop)
    }
}

fn write_record(path: &Path, record: &LockRecord) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    let payload = serde_json::to_vec_pretty(record).map_err(io::Error::other)?;
    if let Err(err) = file.write_all(&payload).and_then(|()| file.sync_all()) {
        drop(file);
        cleanup_file(path);
        return Err(err);
    }
    Ok(())
}

fn read_record(path: &Path) -> Result<Option<LockRecord>, StoreError> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::Io(err)),
    };
    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|err| StoreError::Corrupt {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
}

fn cleanup_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        match err.kind() {
            io::ErrorKind::NotFound => {}
            _ => warn!("Failed to remove lock artifact {}: {err}", path.display()),
        }
    }
}

fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(suffix);
    path.with_file_name(file_name)
}
