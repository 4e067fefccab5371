//! Cortex-M exception stack frame (ESF).
//!
//! On exception entry the core pushes eight words onto the active stack and
//! pops the same eight words on exception return. A new thread is started
//! by writing one of these frames by hand at the top of its stack, so that
//! the first return from the context-switch exception "resumes" it.
//!
//! # Layout
//!
//! Lowest address first, one word each, 8-byte aligned, 32 bytes total on
//! the target:
//!
//! | offset | field  | register |
//! |--------|--------|----------|
//! | 0x00   | `a1`   | r0       |
//! | 0x04   | `a2`   | r1       |
//! | 0x08   | `a3`   | r2       |
//! | 0x0c   | `a4`   | r3       |
//! | 0x10   | `ip`   | r12      |
//! | 0x14   | `lr`   | r14      |
//! | 0x18   | `pc`   | r15      |
//! | 0x1c   | `xpsr` | xPSR     |
//!
//! This layout is fixed by the hardware; it is not ours to change.

use core::mem::{align_of, offset_of, size_of};
use static_assertions::const_assert_eq;

/// xPSR with only the Thumb bit (T, bit 24) set.
///
/// T reads as one on Cortex-M and an exception return with it clear faults,
/// so it has to be written explicitly rather than left at zero.
pub const XPSR_THUMB: u32 = 0x0100_0000;

/// Thumb interworking bit of a code address.
const PC_THUMB_BIT: usize = 1;

/// Hardware exception stack frame.
///
/// Fields are machine words. On the target a word is 32 bits; host builds
/// keep pointer-sized words so that full host addresses survive a round
/// trip through the frame.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Esf {
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub a4: usize,
    pub ip: usize,
    pub lr: usize,
    pub pc: usize,
    pub xpsr: usize,
}

const_assert_eq!(size_of::<Esf>(), 8 * size_of::<usize>());
const_assert_eq!(align_of::<Esf>(), 8);
const_assert_eq!(offset_of!(Esf, a1), 0);
const_assert_eq!(offset_of!(Esf, pc), 6 * size_of::<usize>());
const_assert_eq!(offset_of!(Esf, xpsr), 7 * size_of::<usize>());

#[cfg(target_arch = "arm")]
const_assert_eq!(size_of::<Esf>(), 32);

impl Esf {
    /// Build the frame a new thread is started from.
    ///
    /// `pc` gets `trampoline` with bit 0 cleared: the frame holds the real
    /// halfword-aligned instruction address, while function pointers on
    /// Thumb carry bit 0 set. `a1..a4` carry the entry point and its three
    /// parameters, in that order, for the trampoline to pick up.
    pub const fn initial(
        trampoline: usize,
        entry: usize,
        arg1: usize,
        arg2: usize,
        arg3: usize,
    ) -> Self {
        Self {
            a1: entry,
            a2: arg1,
            a3: arg2,
            a4: arg3,
            ip: 0,
            lr: 0,
            pc: trampoline & !PC_THUMB_BIT,
            xpsr: XPSR_THUMB as usize,
        }
    }

    /// Write an initial frame at `dst`.
    ///
    /// # Safety
    ///
    /// - `dst` must be valid for writes of `size_of::<Esf>()` bytes
    /// - `dst` must be aligned to `align_of::<Esf>()`
    /// - no live reference may alias the destination bytes
    pub unsafe fn write_initial(
        dst: *mut Esf,
        trampoline: usize,
        entry: usize,
        arg1: usize,
        arg2: usize,
        arg3: usize,
    ) {
        debug_assert!(
            dst as usize % align_of::<Esf>() == 0,
            "misaligned ESF at {:#x}",
            dst as usize
        );
        unsafe { dst.write(Self::initial(trampoline, entry, arg1, arg2, arg3)) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pc_thumb_bit_cleared() {
        let esf = Esf::initial(0x0800_1235, 0, 0, 0, 0);
        assert_eq!(esf.pc, 0x0800_1234);

        let esf = Esf::initial(0x0800_1234, 0, 0, 0, 0);
        assert_eq!(esf.pc, 0x0800_1234);
    }

    #[test]
    fn test_argument_registers_in_order() {
        let esf = Esf::initial(0x101, 0xE, 1, 2, 3);
        assert_eq!((esf.a1, esf.a2, esf.a3, esf.a4), (0xE, 1, 2, 3));

        let esf = Esf::initial(0x101, 0, 0, 0, 0);
        assert_eq!((esf.a1, esf.a2, esf.a3, esf.a4), (0, 0, 0, 0));

        let esf = Esf::initial(0x101, usize::MAX, usize::MAX - 1, 1 << 31, 7);
        assert_eq!(esf.a1, usize::MAX);
        assert_eq!(esf.a2, usize::MAX - 1);
        assert_eq!(esf.a3, 1 << 31);
        assert_eq!(esf.a4, 7);
    }

    #[test]
    fn test_xpsr_is_thumb_only() {
        for trampoline in [0usize, 1, 0x2000_0001, usize::MAX] {
            let esf = Esf::initial(trampoline, 1, 2, 3, 4);
            assert_eq!(esf.xpsr, 0x0100_0000);
        }
    }

    #[test]
    fn test_write_initial() {
        let mut slot = Esf::default();
        unsafe { Esf::write_initial(&mut slot, 0x301, 4, 5, 6, 7) };
        assert_eq!(slot, Esf::initial(0x300, 4, 5, 6, 7));
        assert_eq!(slot.ip, 0);
        assert_eq!(slot.lr, 0);
    }
}
