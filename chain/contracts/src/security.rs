//! Reentrancy protection
//!
//! The only point where control leaves the vault is the value transfer in
//! `withdraw`; the guard makes that whole operation non-reentrant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::VaultError;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// A protected function acquires the guard before executing state-changing
/// logic and holds the returned [`ReentrancyLock`] until it completes. Any
/// nested call attempt fails. Dropping the lock releases the guard, so it is
/// released on every exit path, unwinding included.
#[derive(Debug)]
pub struct ReentrancyGuard {
    locked: Arc<AtomicBool>,
}

/// Proof that the guard is held. Releases it on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the lock is dropped"]
pub struct ReentrancyLock {
    locked: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self {
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Acquire the guard. Fails with `ReentrancyDetected` if already held.
    pub fn acquire(&self) -> Result<ReentrancyLock, VaultError> {
        self.locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| VaultError::ReentrancyDetected)?;
        Ok(ReentrancyLock {
            locked: Arc::clone(&self.locked),
        })
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReentrancyLock {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}
