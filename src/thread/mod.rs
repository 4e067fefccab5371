//! Thread control block and thread classification.
//!
//! A thread lives entirely inside its stack: the control block (TCS) sits
//! at the lowest address and the initial exception frame at the highest.
//! Nothing here allocates.

use crate::timeout::{NoTimeouts, TimeoutSubsystem};
use bitflags::bitflags;
#[cfg(feature = "thread-custom-data")]
use core::ffi::c_void;
use core::fmt;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

pub mod entry;
#[cfg(feature = "thread-monitor")]
pub mod monitor;

pub use entry::thread_entry;

/// Priority value that marks a thread as a task rather than a fiber.
pub const TASK_PRIORITY: i32 = -1;

/// Thread body signature: three opaque, pointer-sized parameters.
pub type ThreadEntry = extern "C" fn(usize, usize, usize);

bitflags! {
    /// Raw thread flags word, as stored in the control block.
    ///
    /// A fiber is the absence of `TASK`; see [`ThreadFlags::FIBER`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(transparent)]
    pub struct ThreadFlags: u32 {
        /// Thread is a task
        const TASK = 0x001;
        /// Task may be preempted by a higher-priority task
        const PREEMPTIBLE = 0x020;
    }
}

impl ThreadFlags {
    /// Flags of a fiber at creation: none.
    pub const FIBER: Self = Self::empty();
}

/// Thread classification, decided once from the creation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    /// Task; preemptible unless the scheduler has locked it
    Task { preemptible: bool },
    /// Fiber at an explicit priority level (lower value is more urgent)
    Fiber { priority: i32 },
}

impl ThreadKind {
    /// Classify a creation priority.
    ///
    /// [`TASK_PRIORITY`] yields a preemptible task; anything else is a fiber
    /// at that level. The value is not range-checked or interpreted.
    pub const fn from_priority(priority: i32) -> Self {
        if priority == TASK_PRIORITY {
            ThreadKind::Task { preemptible: true }
        } else {
            ThreadKind::Fiber { priority }
        }
    }

    /// Decode a control block's flags word and priority.
    pub fn from_raw(flags: ThreadFlags, priority: i32) -> Self {
        if flags.contains(ThreadFlags::TASK) {
            ThreadKind::Task {
                preemptible: flags.contains(ThreadFlags::PREEMPTIBLE),
            }
        } else {
            ThreadKind::Fiber { priority }
        }
    }

    /// Flags word for a control block of this kind.
    pub fn flags(self) -> ThreadFlags {
        match self {
            ThreadKind::Task { preemptible: true } => ThreadFlags::TASK | ThreadFlags::PREEMPTIBLE,
            ThreadKind::Task { preemptible: false } => ThreadFlags::TASK,
            ThreadKind::Fiber { .. } => ThreadFlags::FIBER,
        }
    }

    /// Priority value stored in the control block.
    pub const fn priority(self) -> i32 {
        match self {
            ThreadKind::Task { .. } => TASK_PRIORITY,
            ThreadKind::Fiber { priority } => priority,
        }
    }

    pub const fn is_task(self) -> bool {
        matches!(self, ThreadKind::Task { .. })
    }

    pub fn is_preemptible(self) -> bool {
        matches!(self, ThreadKind::Task { preemptible: true })
    }
}

/// Creation options.
///
/// Reserved: accepted by thread creation and otherwise ignored. Every bit
/// pattern is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadOptions(u32);

impl ThreadOptions {
    pub const NONE: Self = Self(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Registers the context switch saves on behalf of a suspended thread.
///
/// The hardware frame covers the caller-saved registers; the kernel saves
/// `r4..r11` here plus the process stack pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalleeSaved {
    /// `v1..v8`, i.e. `r4..r11`
    pub v: [usize; 8],
    /// Process stack pointer; points at the initial frame until first dispatch
    pub psp: usize,
}

/// Thread control block.
///
/// Lives at the base of the thread's own stack, so its address is the
/// thread's identity.
#[repr(C)]
pub struct Tcs<T: TimeoutSubsystem = NoTimeouts> {
    /// Singly linked list link for wait queues and the ready queue
    pub link: Option<NonNull<Tcs<T>>>,
    /// Kind and state bits
    pub flags: ThreadFlags,
    /// Interrupt lock key held across a context switch
    pub intlock_key: u32,
    /// Callee-saved registers and saved stack pointer
    pub preemp_reg: CalleeSaved,
    /// Fiber priority, or [`TASK_PRIORITY`]
    pub prio: i32,
    /// BASEPRI threshold below which this thread allows preemption (0: none)
    pub basepri: u32,
    #[cfg(feature = "thread-custom-data")]
    custom_data: *mut c_void,
    #[cfg(feature = "thread-monitor")]
    pub(crate) next_thread: Option<NonNull<Tcs<T>>>,
    timeout: MaybeUninit<T::Timeout>,
}

impl<T: TimeoutSubsystem> Tcs<T> {
    /// Control block for a thread about to be started from the frame at
    /// `initial_sp`. The timeout slot is left for the timeout subsystem.
    pub(crate) fn new(kind: ThreadKind, priority: i32, initial_sp: usize) -> Self {
        Self {
            link: None,
            flags: kind.flags(),
            intlock_key: 0,
            preemp_reg: CalleeSaved {
                v: [0; 8],
                psp: initial_sp,
            },
            prio: priority,
            basepri: 0,
            #[cfg(feature = "thread-custom-data")]
            custom_data: core::ptr::null_mut(),
            #[cfg(feature = "thread-monitor")]
            next_thread: None,
            timeout: MaybeUninit::uninit(),
        }
    }

    pub fn kind(&self) -> ThreadKind {
        ThreadKind::from_raw(self.flags, self.prio)
    }

    pub fn priority(&self) -> i32 {
        self.prio
    }

    /// Saved process stack pointer.
    pub fn saved_sp(&self) -> usize {
        self.preemp_reg.psp
    }

    /// Uninitialized timeout slot, for [`TimeoutSubsystem::tcs_init`].
    pub fn timeout_slot(&mut self) -> &mut MaybeUninit<T::Timeout> {
        &mut self.timeout
    }

    /// Timeout bookkeeping.
    pub fn timeout(&self) -> &T::Timeout {
        // SAFETY: every control block is handed to `tcs_init` right after
        // it is written, and implementors must initialize the slot.
        unsafe { self.timeout.assume_init_ref() }
    }

    /// Timeout bookkeeping, mutably.
    pub fn timeout_mut(&mut self) -> &mut T::Timeout {
        // SAFETY: see `timeout`.
        unsafe { self.timeout.assume_init_mut() }
    }

    /// Opaque user data attached to this thread.
    #[cfg(feature = "thread-custom-data")]
    pub fn custom_data(&self) -> *mut c_void {
        self.custom_data
    }

    #[cfg(feature = "thread-custom-data")]
    pub fn set_custom_data(&mut self, value: *mut c_void) {
        self.custom_data = value;
    }
}

/// Handle to a created thread: the address of its control block, which is
/// also the base of its stack.
pub struct ThreadHandle<T: TimeoutSubsystem = NoTimeouts>(NonNull<Tcs<T>>);

impl<T: TimeoutSubsystem> ThreadHandle<T> {
    pub(crate) fn new(tcs: NonNull<Tcs<T>>) -> Self {
        Self(tcs)
    }

    pub fn as_ptr(self) -> *mut Tcs<T> {
        self.0.as_ptr()
    }

    /// Numeric handle value; equal to the stack base.
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Borrow the control block.
    ///
    /// # Safety
    ///
    /// The thread's stack must still be alive, and nothing (the thread
    /// itself, the scheduler, an interrupt handler) may write the control
    /// block while the borrow is held.
    pub unsafe fn tcs<'a>(self) -> &'a Tcs<T> {
        unsafe { self.0.as_ref() }
    }
}

impl<T: TimeoutSubsystem> Clone for ThreadHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: TimeoutSubsystem> Copy for ThreadHandle<T> {}

impl<T: TimeoutSubsystem> PartialEq for ThreadHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeoutSubsystem> Eq for ThreadHandle<T> {}

impl<T: TimeoutSubsystem> fmt::Debug for ThreadHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadHandle({:#x})", self.addr())
    }
}
