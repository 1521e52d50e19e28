//! Status codes returned across the `wasi_llm` boundary.
//!
//! Every host function returns exactly one `i32` status. `0` = success,
//! non-zero = one of the two error classes. No text crosses the boundary.

use core::fmt;

/// Host function status codes.
///
/// These repr values are part of the guest ABI and MUST NOT change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrNo {
    /// The operation completed.
    Success = 0,
    /// The guest supplied a malformed request (bad span, null slot,
    /// unknown handle, invalid scalar). Recoverable by the guest.
    InvalidArgument = 1,
    /// The host environment failed (no guest memory, engine failure).
    Internal = 2,
}

impl ErrNo {
    /// Convert from an i32 status returned by a host function.
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::InvalidArgument),
            2 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Return the i32 representation of this status.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns true if this is the `Success` variant.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ErrNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::InvalidArgument => write!(f, "ERR_INVALID_ARGUMENT"),
            Self::Internal => write!(f, "ERR_INTERNAL"),
        }
    }
}
