//! Architecture abstraction layer for interrupt masking and thread bootstrap.
//!
//! Thread creation itself is plain memory writes; the only things it needs
//! from the CPU are a way to mask interrupts around shared kernel lists and
//! the address of the routine a new thread lands in.

pub mod esf;

/// Architecture abstraction trait.
///
/// Implemented once per supported CPU. Everything here is called from
/// kernel code that may be interrupted, so every method must be usable both
/// from thread mode and from an exception handler.
pub trait Arch {
    /// Opaque interrupt state returned by [`Arch::irq_lock`].
    ///
    /// Passing it back to [`Arch::irq_unlock`] restores the mask that was in
    /// effect before the matching lock, which makes lock/unlock pairs nest.
    type IrqKey: Copy;

    /// Required alignment of the top of a thread stack, in bytes.
    const STACK_ALIGN: usize;

    /// Mask interrupts and return the previous interrupt state.
    fn irq_lock() -> Self::IrqKey;

    /// Restore the interrupt state saved by [`Arch::irq_lock`].
    ///
    /// This does not unconditionally enable interrupts: if they were already
    /// masked when the key was taken, they stay masked.
    fn irq_unlock(key: Self::IrqKey);

    /// Check if interrupts are currently enabled.
    fn interrupts_enabled() -> bool;

    /// Put the core to sleep until the next event or interrupt.
    fn idle();
}

// Cortex-M (thumbv6m/thumbv7m/thumbv7em/thumbv8m) - the only real target
#[cfg(target_arch = "arm")]
pub mod cortex_m;
#[cfg(not(target_arch = "arm"))]
#[path = "cortex_m_stub.rs"]
pub mod cortex_m;

pub use cortex_m::CortexM as DefaultArch;
