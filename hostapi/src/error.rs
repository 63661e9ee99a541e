//! Host-bridge error types.
//!
//! `BridgeError` is returned by every register, memory and configuration
//! operation. Host functions never trap on these conditions; they hand the
//! guest an `i32` code via [`to_error_code`](BridgeError::to_error_code).

use std::fmt;

/// Guest-facing status codes returned by bridge host functions.
///
/// `Ok` (0) is success; every other value identifies one [`BridgeError`]
/// variant. Values are stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    OutOfRange = 1,
    OutOfBounds = 2,
    CapacityExceeded = 3,
    InvalidConfiguration = 4,
    UseAfterFree = 5,
    /// Host-side failure not attributable to guest input (missing memory export, etc.).
    Internal = 6,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::OutOfRange => "ERR_OUT_OF_RANGE",
            Self::OutOfBounds => "ERR_OUT_OF_BOUNDS",
            Self::CapacityExceeded => "ERR_CAPACITY_EXCEEDED",
            Self::InvalidConfiguration => "ERR_INVALID_CONFIGURATION",
            Self::UseAfterFree => "ERR_USE_AFTER_FREE",
            Self::Internal => "ERR_INTERNAL",
        };
        f.write_str(name)
    }
}

/// Error type for all bridge primitives.
///
/// Every variant is local and recoverable: the caller decides whether to
/// abort the guest call, surface a trap, or retry with other parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Register index is not below the bank's register count.
    #[error("register index {index} out of range (register count {count})")]
    OutOfRange { index: u32, count: u32 },

    /// Memory access `[offset, offset + len)` falls outside the grown region.
    #[error("memory access [{offset}, {offset}+{len}) out of bounds (size {size} bytes)")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Growth would push the region past its page or slice limits.
    #[error("cannot grow by {requested} pages: {current} pages in use, limit {max_pages}")]
    CapacityExceeded {
        requested: u32,
        current: u32,
        max_pages: u32,
    },

    /// Nonsensical build parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation on a handle whose resources were already released or moved.
    #[error("handle used after its resources were released")]
    UseAfterFree,
}

impl BridgeError {
    /// Convert to the `i32` code returned to the wasm guest.
    pub fn to_error_code(&self) -> i32 {
        self.code().as_i32()
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::OutOfBounds { .. } => ErrorCode::OutOfBounds,
            Self::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            Self::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            Self::UseAfterFree => ErrorCode::UseAfterFree,
        }
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn out_of_bounds(offset: u64, len: u64, size: u64) -> Self {
        Self::OutOfBounds { offset, len, size }
    }
}
