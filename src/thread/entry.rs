//! Landing routine for new threads.
//!
//! The initial exception frame of every thread points its `pc` here. On
//! the first exception return the core pops `r0..r3` from that frame, which
//! under the AAPCS are exactly the four arguments below.

use super::ThreadEntry;
use crate::arch::Arch;

/// Start a thread body and park the core if it ever returns.
///
/// Never called directly; it is only reached through the exception return
/// of a thread's first dispatch.
pub extern "C" fn thread_entry<A: Arch>(
    entry: ThreadEntry,
    arg1: usize,
    arg2: usize,
    arg3: usize,
) -> ! {
    entry(arg1, arg2, arg3);

    // Thread body finished. Stay off the scheduler's hands and let
    // interrupts keep preempting this context.
    #[allow(clippy::empty_loop)]
    loop {
        A::idle();
    }
}

/// Code address of the landing routine for architecture `A`.
///
/// On Thumb this value carries the interworking bit; the frame writer
/// strips it.
#[inline]
pub fn trampoline_addr<A: Arch>() -> usize {
    thread_entry::<A> as *const () as usize
}
