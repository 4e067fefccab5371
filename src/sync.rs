//! Interrupt-safe critical section.
//!
//! Kernel lists that interrupt handlers may also touch are wrapped in an
//! [`IrqMutex`]. Taking it masks interrupts on the local core, which on a
//! single-core part is already mutual exclusion; the inner spin lock only
//! ever contends when host tests drive the same kernel from several host
//! threads.

use crate::arch::Arch;
use core::marker::PhantomData;

/// Data guarded by interrupt masking.
pub struct IrqMutex<A: Arch, T> {
    inner: spin::Mutex<T>,
    _arch: PhantomData<fn() -> A>,
}

impl<A: Arch, T> IrqMutex<A, T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: spin::Mutex::new(value),
            _arch: PhantomData,
        }
    }

    /// Run `f` with interrupts masked and exclusive access to the data.
    ///
    /// The interrupt state in effect before the call is restored afterwards,
    /// so this may be called with interrupts already masked.
    #[inline]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let key = A::irq_lock();
        let result = {
            let mut guard = self.inner.lock();
            f(&mut guard)
        };
        A::irq_unlock(key);
        result
    }
}
