// src/engine/guard.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-slot "a rebuild is executing" flag.
///
/// Acquisition is a compare-and-set that fails fast instead of waiting.
/// The returned [`GuardPermit`] releases the flag when dropped, including
/// when the task holding it is aborted.
#[derive(Debug, Clone, Default)]
pub struct RebuildGuard {
    held: Arc<AtomicBool>,
}

impl RebuildGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag from free to held. `None` if it was already held.
    pub fn try_acquire(&self) -> Option<GuardPermit> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GuardPermit {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`RebuildGuard`].
#[derive(Debug)]
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct GuardPermit {
    held: Arc<AtomicBool>,
}

impl Drop for GuardPermit {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
