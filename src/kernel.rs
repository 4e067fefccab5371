//! Kernel state and thread creation.
//!
//! This module provides the `Nanokernel` state block and the routine that
//! turns a raw block of stack memory into a runnable thread: a control
//! block at the bottom, an initial exception frame at the top, timeout
//! bookkeeping reset and, with `thread-monitor`, an entry in the thread
//! list. Putting the thread on a ready queue is the scheduler's business.

use crate::arch::esf::Esf;
use crate::arch::{Arch, DefaultArch};
use crate::errors::ThreadResult;
use crate::mem::StackRegion;
use crate::thread::entry::trampoline_addr;
use crate::thread::{Tcs, ThreadEntry, ThreadHandle, ThreadKind, ThreadOptions};
use crate::timeout::{NoTimeouts, TimeoutSubsystem};
use core::marker::PhantomData;
use portable_atomic::{AtomicUsize, Ordering};

#[cfg(feature = "thread-monitor")]
use crate::thread::monitor::ThreadMonitor;

/// The kernel state block of the running system.
pub static NANOKERNEL: Nanokernel = Nanokernel::new();

/// Kernel-wide state shared by thread creation and its observers.
///
/// # Type Parameters
///
/// * `A` - Architecture implementation
/// * `T` - Timeout subsystem hooked into every new thread
pub struct Nanokernel<A: Arch = DefaultArch, T: TimeoutSubsystem = NoTimeouts> {
    /// Every thread ever created, newest first
    #[cfg(feature = "thread-monitor")]
    threads: ThreadMonitor<A, T>,
    /// Number of threads created so far
    created: AtomicUsize,
    _marker: PhantomData<fn() -> (A, T)>,
}

impl<A: Arch, T: TimeoutSubsystem> Nanokernel<A, T> {
    pub const fn new() -> Self {
        Self {
            #[cfg(feature = "thread-monitor")]
            threads: ThreadMonitor::new(),
            created: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Initialize a new thread from its stack space.
    ///
    /// The control block is put at `stack_base`. The initial context, an
    /// exception stack frame to be "restored" by the context switch, is put
    /// at the other end of the stack, where it becomes ordinary stack space
    /// once the thread has run. Its `a1..a4` carry `entry` and the three
    /// parameters, and its `pc` points at [`thread_entry`], which calls
    /// `entry(arg1, arg2, arg3)`.
    ///
    /// `priority` is [`TASK_PRIORITY`] for a task, otherwise the fiber's
    /// priority level. `options` is reserved and ignored.
    ///
    /// The thread does not run until the scheduler is handed the returned
    /// handle, whose address equals `stack_base`.
    ///
    /// # Safety
    ///
    /// - `stack_base` must be aligned for [`Tcs`] and to `A::STACK_ALIGN`
    /// - `stack_size` must cover the control block, the initial frame and
    ///   all the stack the thread will ever use
    /// - the memory must stay valid, and untouched by anyone but the new
    ///   thread and the kernel, for the rest of the thread's life (and, with
    ///   `thread-monitor`, for the rest of this kernel's life)
    ///
    /// None of this is checked in release builds.
    ///
    /// [`thread_entry`]: crate::thread::thread_entry
    /// [`TASK_PRIORITY`]: crate::thread::TASK_PRIORITY
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn new_thread(
        &self,
        stack_base: *mut u8,
        stack_size: usize,
        entry: ThreadEntry,
        arg1: usize,
        arg2: usize,
        arg3: usize,
        priority: i32,
        options: ThreadOptions,
    ) -> ThreadHandle<T> {
        let _ = options;
        let stack = unsafe { StackRegion::from_raw_parts(stack_base, stack_size) };

        #[cfg(feature = "init-stacks")]
        unsafe {
            stack.poison();
        }

        let carving = stack.carve::<A, T>();
        let esf = carving.esf.as_ptr();
        let tcs = carving.tcs.as_ptr();

        unsafe {
            Esf::write_initial(
                esf,
                trampoline_addr::<A>(),
                entry as *const () as usize,
                arg1,
                arg2,
                arg3,
            );
        }

        let kind = ThreadKind::from_priority(priority);
        unsafe {
            tcs.write(Tcs::new(kind, priority, esf as usize));
            T::tcs_init(&mut *tcs);
        }

        // Initial values in all other registers and control block entries
        // are irrelevant.

        #[cfg(feature = "thread-monitor")]
        unsafe {
            self.threads.insert(carving.tcs);
        }

        self.created.fetch_add(1, Ordering::Relaxed);

        log::trace!(
            "new thread {:#x}: {:?}, initial frame at {:#x}",
            tcs as usize,
            kind,
            esf as usize
        );

        ThreadHandle::new(carving.tcs)
    }

    /// Create a thread on a stack that is checked first.
    ///
    /// Same as [`Nanokernel::new_thread`], but the memory is taken over for
    /// good and its alignment and minimum size are verified. The caller
    /// still decides how much runtime stack the thread gets.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &self,
        stack: &'static mut [u8],
        entry: ThreadEntry,
        arg1: usize,
        arg2: usize,
        arg3: usize,
        priority: i32,
        options: ThreadOptions,
    ) -> ThreadResult<ThreadHandle<T>> {
        let region = StackRegion::from_slice::<A, T>(stack)?;

        // SAFETY: the region is checked, exclusively owned and 'static.
        Ok(unsafe {
            self.new_thread(
                region.base(),
                region.size(),
                entry,
                arg1,
                arg2,
                arg3,
                priority,
                options,
            )
        })
    }

    /// Number of threads created through this kernel.
    pub fn threads_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// The thread monitor list.
    #[cfg(feature = "thread-monitor")]
    pub fn threads(&self) -> &ThreadMonitor<A, T> {
        &self.threads
    }

    /// Visit every thread ever created, newest first, with interrupts
    /// masked.
    #[cfg(feature = "thread-monitor")]
    pub fn for_each_thread(&self, f: impl FnMut(ThreadHandle<T>)) {
        self.threads.for_each(f);
    }
}

impl<A: Arch, T: TimeoutSubsystem> Default for Nanokernel<A, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a thread registered with the global [`NANOKERNEL`].
///
/// See [`Nanokernel::new_thread`].
///
/// # Safety
///
/// Same contract as [`Nanokernel::new_thread`].
#[allow(clippy::too_many_arguments)]
#[inline]
pub unsafe fn new_thread(
    stack_base: *mut u8,
    stack_size: usize,
    entry: ThreadEntry,
    arg1: usize,
    arg2: usize,
    arg3: usize,
    priority: i32,
    options: ThreadOptions,
) -> ThreadHandle {
    unsafe {
        NANOKERNEL.new_thread(stack_base, stack_size, entry, arg1, arg2, arg3, priority, options)
    }
}
