use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutual-exclusion lock scoped to inventory validation/mutation.
///
/// One guard serializes every read-validate-write sequence against the
/// ledger: availability checks, sufficiency snapshots, and the whole drain
/// batch hold it. Holders never nest acquisitions, so a plain mutex is
/// enough. The lock protects no data of its own; it only orders access to
/// the store, so a poisoned lock is recovered rather than propagated — a
/// panicked holder must not wedge inventory validation for the rest of the
/// process.
#[derive(Debug, Default)]
pub struct ConcurrencyGuard {
    lock: Mutex<()>,
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for the duration of the returned RAII handle.
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
