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

use remote_lock::error::RemoteLockError;
use remote_lock::locking::{AcquireOptions, LockCoordinator, SeededJitter};
use remote_lock::store::{FileStore, MemoryStore, StoreAdapter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const WORKERS: usize = 6;
const ROUNDS: usize = 5;

fn patient() -> AcquireOptions {
    AcquireOptions::new()
        .with_retries(10_000)
        .with_timeout(Duration::from_secs(30))
        .with_wait_time(Duration::from_millis(1))
}

/// Every worker increments `inside` while holding the lock; any overlap
/// shows up as a count above one. Guards are used rather than `with_lock`,
/// whose presence check would let a second holder straight through.
fn run_workers<F>(make_adapter: F)
where
    F: Fn(usize) -> Arc<dyn StoreAdapter>,
{
    let inside = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let coordinator = LockCoordinator::new(make_adapter(worker), Some("it".to_string()))
                .unwrap()
                .with_jitter(Arc::new(SeededJitter::new(worker as u64)));
            let inside = inside.clone();
            let peak = peak.clone();
            let completed = completed.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let guard = coordinator.acquire_guard("shared", &patient()).unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                    completed.fetch_add(1, Ordering::SeqCst);
                    guard.release().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), WORKERS * ROUNDS);
}

#[test]
fn memory_store_serializes_workers() {
    let store = MemoryStore::new();
    run_workers(|_| -> Arc<dyn StoreAdapter> { Arc::new(store.clone()) });
    assert!(store.is_empty());
}

#[test]
fn file_store_serializes_workers() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("locks");
    // Each worker opens its own handle on the shared directory.
    run_workers(|_| -> Arc<dyn StoreAdapter> { Arc::new(FileStore::open(&root).unwrap()) });

    let probe = FileStore::open(&root).unwrap();
    assert!(!probe.has_key("it|lock|shared").unwrap());
}

#[test]
fn contended_acquire_gives_up_after_retries() {
    let store = MemoryStore::new();
    let holder = LockCoordinator::new(Arc::new(store.clone()), None).unwrap();
    let contender = LockCoordinator::new(Arc::new(store.clone()), None).unwrap();
    holder.acquire("report", &AcquireOptions::new()).unwrap();

    let options = AcquireOptions::new()
        .with_retries(3)
        .with_initial_wait(Duration::from_millis(1));
    let err = contender.acquire("report", &options).unwrap_err();
    match err {
        RemoteLockError::LockAcquisitionFailed { key, attempts, .. } => {
            assert_eq!(key, "lock|report");
            assert_eq!(attempts, 3);
        }
        other => panic!("Expected contention, got {other:?}"),
    }

    holder.release("report").unwrap();
    contender.acquire("report", &options).unwrap();
    assert!(holder.is_acquired("report").unwrap());
}

#[test]
fn expired_record_can_be_taken_over() {
    let temp = TempDir::new().unwrap();
    let first = LockCoordinator::new(Arc::new(FileStore::open(temp.path()).unwrap()), None).unwrap();
    let second =
        LockCoordinator::new(Arc::new(FileStore::open(temp.path()).unwrap()), None).unwrap();

    first
        .acquire(
            "job",
            &AcquireOptions::new().with_expiry(Duration::from_millis(50)),
        )
        .unwrap();
    assert!(second.is_acquired("job").unwrap());

    thread::sleep(Duration::from_millis(120));
    assert!(!second.is_acquired("job").unwrap());
    second
        .acquire("job", &AcquireOptions::new().with_retries(1))
        .unwrap();
    assert!(first.is_acquired("job").unwrap());
}

#[test]
fn with_lock_runs_directly_while_another_caller_holds_the_key() {
    let store = MemoryStore::new();
    let holder = LockCoordinator::new(Arc::new(store.clone()), None).unwrap();
    let other = LockCoordinator::new(Arc::new(store.clone()), None).unwrap();
    holder.acquire("shared", &AcquireOptions::new()).unwrap();

    let result: Result<u32, RemoteLockError> =
        other.with_lock("shared", &AcquireOptions::new().with_retries(1), || Ok(1));
    assert_eq!(result.unwrap(), 1);
    // The holder's record is left alone.
    assert!(holder.is_acquired("shared").unwrap());
}

#[test]
fn timeout_bounds_a_long_retry_budget() {
    let store = MemoryStore::new();
    let holder = LockCoordinator::new(Arc::new(store.clone()), None).unwrap();
    holder.acquire("slow", &AcquireOptions::new()).unwrap();

    let contender = LockCoordinator::new(Arc::new(store), None).unwrap();
    let options = AcquireOptions::new()
        .with_retries(1_000_000)
        .with_timeout(Duration::from_millis(100))
        .with_wait_time(Duration::from_millis(10));

    let started = std::time::Instant::now();
    let err = contender.acquire("slow", &options).unwrap_err();
    assert!(err.is_contention());
    assert!(started.elapsed() < Duration::from_secs(5));
}
