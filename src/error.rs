//! # Status Codes
//!
//! Every fallible kernel operation reports its outcome through
//! [`KernelResult`]; nothing aborts the process. Callers own any retry
//! policy.

/// Error category returned by kernel operations.
///
/// Task operations addressing an unused slot report [`NotInitialized`],
/// while pool operations on a missing record report [`General`] or succeed
/// silently — the two not-found flavors are deliberately not unified.
///
/// [`NotInitialized`]: KernelError::NotInitialized
/// [`General`]: KernelError::General
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// General failure: task table overfull, or a pool record was not found
    /// where one was required.
    General,
    /// A tick-counted wait elapsed without its condition being met.
    Timeout,
    /// A parameter was rejected before any state changed: id out of range
    /// or a zero duration.
    InvalidParam,
    /// The kernel has not been initialized, or the addressed task slot is
    /// unused.
    NotInitialized,
    /// A fixed-capacity pool has no free record left. Existing records are
    /// untouched.
    Busy,
}

/// Result alias used throughout the kernel. Success carries no payload for
/// most operations.
pub type KernelResult<T = ()> = Result<T, KernelError>;
