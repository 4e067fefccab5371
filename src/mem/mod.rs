//! Memory management for thread stacks.
//!
//! Stacks are caller-supplied; this module only describes them and carves
//! the kernel's per-thread structures out of them.

pub mod stack;

pub use stack::{min_stack_size, round_down, StackRegion, STACK_POISON};
