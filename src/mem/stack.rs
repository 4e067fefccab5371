//! Thread stack regions.
//!
//! A stack region is one contiguous byte arena that a thread owns for its
//! whole life. Two typed views are carved out of it at creation:
//!
//! ```text
//!  base                                                    end
//!   |  Tcs  |  .... runtime stack grows downwards ....  | Esf |pad|
//!   ^                                                   ^
//!   control block                      initial frame, STACK_ALIGN-aligned
//! ```
//!
//! The control block never moves. The frame is only read once, by the
//! first context switch into the thread, after which its bytes are ordinary
//! stack.

use crate::arch::esf::Esf;
use crate::arch::Arch;
use crate::errors::StackError;
use crate::thread::Tcs;
use crate::timeout::TimeoutSubsystem;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

/// Fill byte for unused stack when the `init-stacks` feature is on.
pub const STACK_POISON: u8 = 0xAA;

/// Round `addr` down to a multiple of `align` (a power of two).
#[inline(always)]
pub const fn round_down(addr: usize, align: usize) -> usize {
    addr & !(align - 1)
}

/// Smallest region that holds a control block and an initial frame.
///
/// Any runtime stack the thread needs comes on top of this.
pub const fn min_stack_size<A: Arch, T: TimeoutSubsystem>() -> usize {
    let raw = size_of::<Tcs<T>>() + size_of::<Esf>();
    (raw + A::STACK_ALIGN - 1) & !(A::STACK_ALIGN - 1)
}

/// A caller-owned block of memory used as one thread's stack.
#[derive(Debug)]
pub struct StackRegion {
    base: NonNull<u8>,
    size: usize,
}

/// The two typed views carved out of a region.
pub(crate) struct Carving<T: TimeoutSubsystem> {
    pub(crate) tcs: NonNull<Tcs<T>>,
    pub(crate) esf: NonNull<Esf>,
}

impl StackRegion {
    /// Describe `size` bytes at `base` without checking anything.
    ///
    /// # Safety
    ///
    /// - `base` must be non-null and valid for reads and writes of `size`
    ///   bytes for as long as any thread created on it exists
    /// - nothing else may access the region during that time
    #[inline(always)]
    pub unsafe fn from_raw_parts(base: *mut u8, size: usize) -> Self {
        debug_assert!(!base.is_null(), "null stack base");
        Self {
            base: unsafe { NonNull::new_unchecked(base) },
            size,
        }
    }

    /// Take ownership of `mem` as a stack for architecture `A` and
    /// timeout configuration `T`, checking alignment and size.
    pub fn from_slice<A: Arch, T: TimeoutSubsystem>(
        mem: &'static mut [u8],
    ) -> Result<Self, StackError> {
        let base = mem.as_mut_ptr() as usize;
        let size = mem.len();

        let align = A::STACK_ALIGN.max(align_of::<Tcs<T>>());
        if base % align != 0 {
            return Err(StackError::Misaligned { base, align });
        }

        let min = min_stack_size::<A, T>();
        if size < min {
            return Err(StackError::TooSmall { size, min });
        }

        if base.checked_add(size).is_none() {
            return Err(StackError::Overflow { base, size });
        }

        // SAFETY: `mem` is an exclusive borrow that lives forever.
        Ok(unsafe { Self::from_raw_parts(mem.as_mut_ptr(), size) })
    }

    /// Lowest address of the region; also the thread handle.
    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// One past the highest address of the region.
    pub fn end(&self) -> usize {
        self.base.as_ptr() as usize + self.size
    }

    /// Address of the initial frame: flush below the aligned top.
    #[inline(always)]
    pub fn initial_frame_addr<A: Arch>(&self) -> usize {
        round_down(self.end(), A::STACK_ALIGN) - size_of::<Esf>()
    }

    /// Compute the control block and initial frame views.
    ///
    /// Bounds and overlap are only checked in debug builds; release builds
    /// trust the caller's contract.
    #[inline(always)]
    pub(crate) fn carve<A: Arch, T: TimeoutSubsystem>(&self) -> Carving<T> {
        let base = self.base.as_ptr() as usize;
        let esf = self.initial_frame_addr::<A>();

        debug_assert!(
            base % align_of::<Tcs<T>>() == 0,
            "stack base {:#x} misaligned for the control block",
            base
        );
        debug_assert!(
            esf % align_of::<Esf>() == 0,
            "initial frame {:#x} misaligned",
            esf
        );
        debug_assert!(
            base + size_of::<Tcs<T>>() <= esf && esf + size_of::<Esf>() <= self.end(),
            "stack of {} bytes at {:#x} too small for control block and initial frame",
            self.size,
            base
        );

        Carving {
            tcs: self.base.cast(),
            // SAFETY: `esf` lies inside the region, which is non-null.
            esf: unsafe { NonNull::new_unchecked(esf as *mut Esf) },
        }
    }

    /// Fill the whole region with [`STACK_POISON`].
    ///
    /// # Safety
    ///
    /// The region must be writable and not in use by anyone.
    #[cfg(feature = "init-stacks")]
    pub(crate) unsafe fn poison(&self) {
        unsafe { core::ptr::write_bytes(self.base.as_ptr(), STACK_POISON, self.size) };
    }

    /// Bytes just above the control block that still hold the poison
    /// pattern, i.e. stack the thread has never touched.
    ///
    /// # Safety
    ///
    /// The region must hold a thread created with `init-stacks` enabled and
    /// the configuration `T`, and must still be readable.
    #[cfg(feature = "init-stacks")]
    pub unsafe fn unused_bytes<T: TimeoutSubsystem>(&self) -> usize {
        let start = size_of::<Tcs<T>>().min(self.size);
        let tail = unsafe {
            core::slice::from_raw_parts(self.base.as_ptr().add(start), self.size - start)
        };
        tail.iter().take_while(|&&b| b == STACK_POISON).count()
    }
}
