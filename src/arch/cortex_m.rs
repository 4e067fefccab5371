//! ARM Cortex-M architecture implementation.
//!
//! Interrupt masking goes through PRIMASK, which exists on every M-profile
//! core (ARMv6-M included), so one implementation covers the whole family.

use super::Arch;
use core::arch::asm;

/// Cortex-M architecture implementation.
pub struct CortexM;

impl Arch for CortexM {
    /// Raw PRIMASK value at the time of the lock.
    type IrqKey = u32;

    const STACK_ALIGN: usize = 8;

    #[inline(always)]
    fn irq_lock() -> u32 {
        let primask: u32;
        // No `nomem`: the asm block doubles as a compiler barrier so list
        // accesses cannot be hoisted out of the critical section.
        unsafe {
            asm!(
                "mrs {primask}, PRIMASK",
                "cpsid i",
                primask = out(reg) primask,
                options(nostack, preserves_flags)
            );
        }
        primask
    }

    #[inline(always)]
    fn irq_unlock(key: u32) {
        unsafe {
            asm!(
                "msr PRIMASK, {key}",
                key = in(reg) key,
                options(nostack, preserves_flags)
            );
        }
    }

    fn interrupts_enabled() -> bool {
        let primask: u32;
        unsafe {
            asm!(
                "mrs {primask}, PRIMASK",
                primask = out(reg) primask,
                options(nomem, nostack, preserves_flags)
            );
        }
        primask & 1 == 0
    }

    #[inline]
    fn idle() {
        unsafe {
            asm!("wfi", options(nomem, nostack, preserves_flags));
        }
    }
}
