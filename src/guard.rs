use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// A panic while holding the lock leaves the map itself consistent: every mutation is a
// single insert/remove/clear call. Recover the guard instead of propagating the poison.

pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock = what, "recovering poisoned lock");
            poisoned.into_inner()
        }
    }
}

pub(crate) fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    what: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(lock = what, "recovering poisoned lock");
            poisoned.into_inner()
        }
    }
}
