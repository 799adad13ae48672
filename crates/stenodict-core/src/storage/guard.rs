//! Exclusion guard
//!
//! Every dictionary operation runs while holding the guard. Acquisition is
//! bounded: a caller that cannot get the lock in time gets
//! [`DictionaryError::GuardTimeout`] instead of blocking forever. Contention
//! here means something is holding the lock across a blocking call, which is
//! a bug rather than load.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::error;

use super::error::{DictResult, DictionaryError};

/// Default bound on lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(1000);

/// A value that can only be reached while holding its lock
pub struct ExclusiveCell<T> {
    inner: Mutex<T>,
    timeout: Duration,
}

impl<T> ExclusiveCell<T> {
    pub fn new(value: T, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(value),
            timeout,
        }
    }

    /// Acquire the guard, waiting at most the configured timeout
    ///
    /// The guard is released when dropped, on every exit path.
    pub fn acquire(&self) -> DictResult<MutexGuard<'_, T>> {
        match self.inner.try_lock_for(self.timeout) {
            Some(guard) => Ok(guard),
            None => {
                error!(timeout = ?self.timeout, "dictionary lock acquisition timed out");
                Err(DictionaryError::GuardTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }

}
