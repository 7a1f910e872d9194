//! Multiple readers / single writer lock
//!
//! Many readers may hold the gate at once; a writer excludes everyone else.
//! The gate is not reentrant and a read acquisition cannot be upgraded: a
//! thread already holding it must not acquire it again.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Reader/writer lock protecting a value of type `T`
#[derive(Default)]
pub struct Gate<T> {
    inner: RwLock<T>,
}

impl<T> Gate<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquire the gate in read mode
    pub fn acquire_read(&self) -> ReadGuard<'_, T> {
        ReadGuard(self.inner.read())
    }

    /// Acquire the gate in write mode
    pub fn acquire_write(&self) -> WriteGuard<'_, T> {
        WriteGuard(self.inner.write())
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate").field("inner", &self.inner).finish()
    }
}

/// Shared access to the protected value
pub struct ReadGuard<'a, T>(RwLockReadGuard<'a, T>);

impl<T> ReadGuard<'_, T> {
    /// Release the gate
    pub fn release(self) {}
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Exclusive access to the protected value
pub struct WriteGuard<'a, T>(RwLockWriteGuard<'a, T>);

impl<T> WriteGuard<'_, T> {
    /// Release the gate
    pub fn release(self) {}
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
