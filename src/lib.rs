#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(unreachable_pub)]

//! Thread and fiber creation for an ARM Cortex-M real-time nanokernel.
//!
//! A thread is made from nothing but a block of stack memory. Its control
//! block is carved from the low end of that block and a synthetic exception
//! frame from the high end, so that the kernel's ordinary exception-return
//! path starts the thread as if it had merely been interrupted.
//!
//! # Features
//!
//! - `thread-monitor`: keep a list of every thread ever created (default)
//! - `thread-custom-data`: per-thread opaque user pointer
//! - `init-stacks`: fill new stacks with `0xAA` for usage measurement
//! - `std-shim`: enable compatibility layer for testing on host
//!
//! # Quick Start
//!
//! ```ignore
//! use nanokernel_threads::{new_thread, ThreadOptions, TASK_PRIORITY};
//!
//! #[repr(C, align(8))]
//! struct Stack([u8; 1024]);
//! static mut WORKER_STACK: Stack = Stack([0; 1024]);
//!
//! extern "C" fn worker(a: usize, b: usize, c: usize) {
//!     loop { /* thread work */ }
//! }
//!
//! let handle = unsafe {
//!     let stack = core::ptr::addr_of_mut!(WORKER_STACK).cast::<u8>();
//!     new_thread(stack, 1024, worker, 1, 2, 3, TASK_PRIORITY, ThreadOptions::NONE)
//! };
//! // hand `handle` to the scheduler
//! ```
//!
//! # Architecture
//!
//! - `arch`: interrupt masking and the Cortex-M exception frame layout
//! - `mem`: stack regions and how they are carved
//! - `thread`: control block, classification, landing routine, monitor
//! - `kernel`: the kernel state block and thread creation

pub mod arch;
pub mod errors;
pub mod kernel;
pub mod mem;
pub mod sync;
pub mod thread;
pub mod timeout;

#[cfg(any(test, feature = "std-shim"))]
extern crate std;

// ============================================================================
// Public API
// ============================================================================

// Architecture abstraction
pub use arch::esf::{Esf, XPSR_THUMB};
pub use arch::{Arch, DefaultArch};

// Kernel
pub use kernel::{new_thread, Nanokernel, NANOKERNEL};

// Threads
pub use thread::{
    thread_entry, Tcs, ThreadEntry, ThreadFlags, ThreadHandle, ThreadKind, ThreadOptions,
    TASK_PRIORITY,
};
#[cfg(feature = "thread-monitor")]
pub use thread::monitor::ThreadMonitor;

// Memory management
pub use mem::{StackRegion, STACK_POISON};

// Timeouts
pub use timeout::{NoTimeouts, TimeoutSubsystem};

// Errors
pub use errors::{StackError, ThreadError, ThreadResult};
