//! Error types for the checked thread-creation path.
//!
//! The raw creation routine cannot fail: a bad stack is a contract
//! violation, not a runtime error. Callers that start from an arbitrary
//! byte slice go through [`StackRegion::from_slice`] instead, which reports
//! what is wrong with the memory before any of it is touched.
//!
//! [`StackRegion::from_slice`]: crate::mem::StackRegion::from_slice

#![allow(clippy::uninlined_format_args)]

use core::fmt;

/// Result type for threading operations.
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Error type for all checked threading operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// The supplied stack memory cannot host a thread
    Stack(StackError),
}

/// Reasons a block of memory was rejected as a thread stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// Base address does not satisfy the control block alignment
    Misaligned { base: usize, align: usize },
    /// Region cannot hold the control block and the initial frame
    TooSmall { size: usize, min: usize },
    /// Region wraps around the end of the address space
    Overflow { base: usize, size: usize },
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::Stack(e) => write!(f, "Invalid thread stack: {}", e),
        }
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Misaligned { base, align } => {
                write!(f, "base {:#x} is not {}-byte aligned", base, align)
            }
            StackError::TooSmall { size, min } => {
                write!(f, "{} bytes is below the minimum of {}", size, min)
            }
            StackError::Overflow { base, size } => {
                write!(f, "{} bytes at {:#x} overflow the address space", size, base)
            }
        }
    }
}

impl From<StackError> for ThreadError {
    fn from(error: StackError) -> Self {
        ThreadError::Stack(error)
    }
}
