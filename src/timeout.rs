//! Contract with the timeout subsystem.
//!
//! Every thread control block carries a slot of per-thread timeout
//! bookkeeping whose type and meaning belong to the timeout subsystem.
//! Thread creation only reserves the slot and hands the new block to
//! [`TimeoutSubsystem::tcs_init`] so the bookkeeping starts out idle.

use crate::thread::Tcs;

/// Per-thread hook into the timeout subsystem.
///
/// # Safety
///
/// [`TimeoutSubsystem::tcs_init`] must fully initialize the slot returned
/// by [`Tcs::timeout_slot`]. The rest of the kernel reads it back through
/// [`Tcs::timeout`] without further checks.
pub unsafe trait TimeoutSubsystem: Sized {
    /// Bookkeeping stored inline in every control block.
    type Timeout;

    /// Put a freshly carved thread's bookkeeping into its idle state.
    fn tcs_init(tcs: &mut Tcs<Self>);
}

/// Kernel configuration without timeouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimeouts;

unsafe impl TimeoutSubsystem for NoTimeouts {
    type Timeout = ();

    #[inline(always)]
    fn tcs_init(tcs: &mut Tcs<Self>) {
        tcs.timeout_slot().write(());
    }
}
