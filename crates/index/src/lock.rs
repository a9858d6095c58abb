//! Cross-process and in-process open coordination
//!
//! Opening the index store follows a fixed lifecycle:
//! `Closed → (lock-wait) → Opening → Open → Disposing → Closed`.
//!
//! The lock-wait step is a coarse courtesy: poll for a previous writer's
//! lock marker for up to ~5 seconds so that rolling restarts hand the store
//! over instead of failing startup. It proves nothing. The OS lock taken by
//! [`crate::store::IndexStore::open`] is the actual single-writer
//! enforcement, and still rejects the open if the holder is alive after the
//! budget runs out.
//!
//! Within one process, an open mutex serializes open attempts between
//! threads. The guard is held for the whole lifetime of the open handle, so
//! a borrow-based lock guard will not do; a mutex/condvar pair hands out an
//! owned guard that travels with the handle and releases on drop.

use std::path::Path;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Maximum number of polls for a foreign lock marker.
pub const LOCK_WAIT_RETRIES: u32 = 50;
/// Delay between polls.
pub const LOCK_WAIT_DELAY: Duration = Duration::from_millis(100);

/// Block until the lock marker disappears or the retry budget is exhausted.
///
/// Returns `true` if the marker cleared, `false` on budget exhaustion.
/// Either way the caller proceeds to open the store.
pub fn wait_for_marker_release(dir: &Path) -> bool {
    wait_for_marker_release_with(dir, LOCK_WAIT_RETRIES, LOCK_WAIT_DELAY)
}

fn wait_for_marker_release_with(dir: &Path, retries: u32, delay: Duration) -> bool {
    let marker = dir.join(crate::store::LOCK_FILE_NAME);
    let mut retry = retries;
    while retry > 0 && marker.exists() {
        std::thread::sleep(delay);
        retry -= 1;
    }
    !marker.exists()
}

struct OpenSlot {
    held: Mutex<bool>,
    released: Condvar,
}

static OPEN_SLOT: OpenSlot = OpenSlot {
    held: Mutex::new(false),
    released: Condvar::new(),
};

/// Owned guard on the process-local open mutex. Released on drop.
#[derive(Debug)]
pub struct ProcessLockGuard(());

impl Drop for ProcessLockGuard {
    fn drop(&mut self) {
        let mut held = OPEN_SLOT.held.lock();
        *held = false;
        OPEN_SLOT.released.notify_one();
    }
}

/// Acquire the process-local open mutex, blocking until it is free.
///
/// Blocks indefinitely: a second open attempt in the same process waits for
/// the first handle to close, matching the cross-process marker wait in
/// spirit but without its budget.
pub fn acquire_process_lock() -> ProcessLockGuard {
    let mut held = OPEN_SLOT.held.lock();
    while *held {
        OPEN_SLOT.released.wait(&mut held);
    }
    *held = true;
    ProcessLockGuard(())
}
