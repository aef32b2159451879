//! Scoped release of native resources.
//!
//! Every native allocation made while capturing or querying (an XImage, an
//! XFree-able property buffer, a device context, a bitmap) is wrapped in a
//! [`Guard`] the moment it is acquired.  The release closure then runs on
//! every exit path: normal return, `?` propagation, and unwinding.
//!
//! Guards declared later in a scope drop first, so declaring them in
//! acquisition order releases in reverse acquisition order.

use std::mem::ManuallyDrop;
use std::ops::Deref;

/// Owns `value` and calls `release(value)` exactly once when dropped.
pub struct Guard<T, F>
where
    F: FnOnce(T),
{
    value: ManuallyDrop<T>,
    release: ManuallyDrop<F>,
}

impl<T, F> Guard<T, F>
where
    F: FnOnce(T),
{
    pub fn new(value: T, release: F) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            release: ManuallyDrop::new(release),
        }
    }
}

impl<T, F> Deref for Guard<T, F>
where
    F: FnOnce(T),
{
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, F> Drop for Guard<T, F>
where
    F: FnOnce(T),
{
    fn drop(&mut self) {
        // SAFETY: `drop` runs once, and neither field is touched afterwards.
        let (value, release) = unsafe {
            (
                ManuallyDrop::take(&mut self.value),
                ManuallyDrop::take(&mut self.release),
            )
        };
        release(value);
    }
}
