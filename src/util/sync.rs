use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a read guard, recovering the data of a poisoned lock.
///
/// A panicking callback must never take a safety component down with it,
/// so poisoning is ignored: the protected state is always left consistent
/// by the writers in this crate before they call out.
pub fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires a write guard, recovering the data of a poisoned lock.
pub fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
