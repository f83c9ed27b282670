//! Lock Manager
//!
//! Scoped access to the cross-process sysroot lock. Acquisition blocks until
//! the store grants the lock; the returned guard releases it when dropped, so
//! every early return out of a pipeline unlocks as well.

use std::time::Instant;

use tracing::debug;

use crate::domain::ports::DeploymentStore;
use crate::error::{OtaError, OtaResult};

/// Hands out sysroot lock guards for one store
pub struct LockManager<'s> {
    store: &'s dyn DeploymentStore,
}

impl<'s> LockManager<'s> {
    pub fn new(store: &'s dyn DeploymentStore) -> Self {
        Self { store }
    }

    /// Block until the exclusive lock is held.
    ///
    /// There is no timeout. Only a store failure ends the wait early, and is
    /// reported as `OtaError::Lock`.
    pub fn acquire(&self, label: &'static str) -> OtaResult<SysrootLock<'s>> {
        debug!(operation = label, "waiting for lock");
        let started = Instant::now();
        self.store.lock().map_err(|e| OtaError::Lock {
            message: e.to_string(),
        })?;
        debug!(
            operation = label,
            waited_ms = started.elapsed().as_millis() as u64,
            "lock acquired"
        );
        Ok(SysrootLock {
            store: self.store,
            label,
            held: true,
        })
    }
}

/// Held sysroot lock; released on drop
#[must_use = "the sysroot lock is released as soon as the guard is dropped"]
pub struct SysrootLock<'s> {
    store: &'s dyn DeploymentStore,
    label: &'static str,
    held: bool,
}

impl SysrootLock<'_> {
    /// Release now. Further calls, and the eventual drop, do nothing.
    pub fn release(&mut self) {
        if self.held {
            self.held = false;
            self.store.unlock();
            debug!(operation = self.label, "lock released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for SysrootLock<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
