//! Thread monitor: an insert-only list of every thread ever created.
//!
//! The list is threaded through the `next_thread` field of each control
//! block, newest first. Threads are never removed here. Insertion and
//! traversal both run inside the kernel's interrupt-safe critical section,
//! since threads may be created from interrupt context.

use super::{Tcs, ThreadHandle};
use crate::arch::Arch;
use crate::sync::IrqMutex;
use crate::timeout::TimeoutSubsystem;
use core::ptr::NonNull;

/// Head of the monitor list.
struct ThreadList<T: TimeoutSubsystem> {
    head: Option<NonNull<Tcs<T>>>,
}

// Control blocks in the list are only reached through the IrqMutex.
unsafe impl<T: TimeoutSubsystem> Send for ThreadList<T> {}

/// Registry of all threads.
pub struct ThreadMonitor<A: Arch, T: TimeoutSubsystem> {
    threads: IrqMutex<A, ThreadList<T>>,
}

impl<A: Arch, T: TimeoutSubsystem> ThreadMonitor<A, T> {
    pub const fn new() -> Self {
        Self {
            threads: IrqMutex::new(ThreadList { head: None }),
        }
    }

    /// Push a freshly created thread at the head of the list.
    ///
    /// # Safety
    ///
    /// - `tcs` must point to an initialized control block that stays valid
    ///   for as long as this monitor is alive
    /// - `tcs` must not already be on this list
    pub unsafe fn insert(&self, tcs: NonNull<Tcs<T>>) {
        self.threads.lock(|list| {
            unsafe { (*tcs.as_ptr()).next_thread = list.head };
            list.head = Some(tcs);
        });
        log::trace!("monitor: added thread {:#x}", tcs.as_ptr() as usize);
    }

    /// Visit every registered thread, newest first.
    ///
    /// `f` runs with interrupts masked; keep it short.
    pub fn for_each(&self, mut f: impl FnMut(ThreadHandle<T>)) {
        self.threads.lock(|list| {
            let mut cursor = list.head;
            while let Some(tcs) = cursor {
                f(ThreadHandle::new(tcs));
                // SAFETY: list members are valid for the monitor's lifetime.
                cursor = unsafe { (*tcs.as_ptr()).next_thread };
            }
        });
    }

    /// Number of registered threads.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(|_| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.threads.lock(|list| list.head.is_none())
    }
}

impl<A: Arch, T: TimeoutSubsystem> Default for ThreadMonitor<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::DefaultArch;
    use crate::thread::ThreadKind;
    use crate::timeout::NoTimeouts;
    use std::boxed::Box;
    use std::vec::Vec;

    fn leaked_tcs(prio: i32) -> NonNull<Tcs<NoTimeouts>> {
        let mut tcs = Box::new(Tcs::new(ThreadKind::from_priority(prio), prio, 0));
        NoTimeouts::tcs_init(&mut tcs);
        NonNull::from(Box::leak(tcs))
    }

    #[test]
    fn test_newest_first() {
        let monitor: ThreadMonitor<DefaultArch, NoTimeouts> = ThreadMonitor::new();
        assert!(monitor.is_empty());

        let t1 = leaked_tcs(1);
        let t2 = leaked_tcs(2);
        let t3 = leaked_tcs(3);
        unsafe {
            monitor.insert(t1);
            monitor.insert(t2);
            monitor.insert(t3);
        }

        let mut order = Vec::new();
        monitor.for_each(|h| order.push(h.as_ptr()));
        assert_eq!(order, [t3.as_ptr(), t2.as_ptr(), t1.as_ptr()]);
        assert_eq!(monitor.len(), 3);
    }

    #[test]
    fn test_insert_does_not_touch_link() {
        let monitor: ThreadMonitor<DefaultArch, NoTimeouts> = ThreadMonitor::new();
        let t1 = leaked_tcs(4);
        let t2 = leaked_tcs(5);
        unsafe {
            monitor.insert(t1);
            monitor.insert(t2);
            assert!((*t2.as_ptr()).link.is_none());
            assert_eq!((*t2.as_ptr()).next_thread, Some(t1));
        }
    }
}
