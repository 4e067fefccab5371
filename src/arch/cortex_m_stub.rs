//! Stub implementation of the Cortex-M layer for non-ARM targets.
//!
//! This module provides type-compatible stubs for testing on development
//! hosts. PRIMASK is modelled in software: per host thread when `std` is
//! linked (each host thread plays one CPU), as a single global otherwise.
//! Under `cfg(test)` the stub can also raise "interrupts" at lock/unlock
//! boundaries; they are delivered as soon as the modelled mask is clear.

use super::Arch;

/// Cortex-M architecture implementation (stub for host builds).
pub struct CortexM;

#[cfg(any(test, feature = "std-shim"))]
mod primask {
    use core::cell::Cell;

    std::thread_local! {
        static PRIMASK: Cell<bool> = const { Cell::new(false) };
    }

    pub(super) fn get() -> bool {
        PRIMASK.with(|m| m.get())
    }

    pub(super) fn set(masked: bool) {
        PRIMASK.with(|m| m.set(masked));
    }
}

#[cfg(not(any(test, feature = "std-shim")))]
mod primask {
    use portable_atomic::{AtomicBool, Ordering};

    static PRIMASK: AtomicBool = AtomicBool::new(false);

    pub(super) fn get() -> bool {
        PRIMASK.load(Ordering::Acquire)
    }

    pub(super) fn set(masked: bool) {
        PRIMASK.store(masked, Ordering::Release);
    }
}

impl Arch for CortexM {
    /// Modelled PRIMASK bit at the time of the lock.
    type IrqKey = bool;

    const STACK_ALIGN: usize = 8;

    fn irq_lock() -> bool {
        #[cfg(test)]
        irq_injection::boundary();

        let previous = primask::get();
        primask::set(true);

        #[cfg(test)]
        irq_injection::boundary();
        previous
    }

    fn irq_unlock(key: bool) {
        #[cfg(test)]
        irq_injection::boundary();

        primask::set(key);

        #[cfg(test)]
        irq_injection::boundary();
    }

    fn interrupts_enabled() -> bool {
        !primask::get()
    }

    fn idle() {
        core::hint::spin_loop();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_lock_masks_and_unlock_restores() {
        assert!(CortexM::interrupts_enabled());
        let key = CortexM::irq_lock();
        assert!(!key);
        assert!(!CortexM::interrupts_enabled());
        CortexM::irq_unlock(key);
        assert!(CortexM::interrupts_enabled());
    }

    #[test]
    fn test_nested_unlock_keeps_outer_mask() {
        let outer = CortexM::irq_lock();
        let inner = CortexM::irq_lock();
        assert!(inner);

        CortexM::irq_unlock(inner);
        assert!(!CortexM::interrupts_enabled());

        CortexM::irq_unlock(outer);
        assert!(CortexM::interrupts_enabled());
    }

    #[test]
    fn test_pended_handler_waits_for_unmask() {
        use std::rc::Rc;

        let fired = Rc::new(Cell::new(0u32));
        let outer = CortexM::irq_lock();

        let f = fired.clone();
        irq_injection::pend(move || f.set(f.get() + 1));

        // Masked: neither boundary may deliver.
        let inner = CortexM::irq_lock();
        CortexM::irq_unlock(inner);
        assert_eq!(fired.get(), 0);

        CortexM::irq_unlock(outer);
        assert_eq!(fired.get(), 1);
        assert_eq!(irq_injection::pending(), 0);
    }

    #[test]
    fn test_raised_handler_waits_out_the_masked_window() {
        use core::cell::RefCell;
        use std::rc::Rc;
        use std::vec::Vec;

        for boundary in 0..4 {
            let log = Rc::new(RefCell::new(Vec::new()));
            let l = log.clone();
            irq_injection::raise_at(boundary, move || l.borrow_mut().push("irq"));

            let key = CortexM::irq_lock();
            log.borrow_mut().push("locked");
            log.borrow_mut().push("unlocking");
            CortexM::irq_unlock(key);

            let expected: &[&str] = if boundary == 0 {
                &["irq", "locked", "unlocking"]
            } else {
                &["locked", "unlocking", "irq"]
            };
            assert_eq!(*log.borrow(), expected, "raised at boundary {}", boundary);
            assert_eq!(irq_injection::pending(), 0);
        }
    }
}
