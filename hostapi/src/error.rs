//! Host-side error types for the `wasi_llm` bridge.
//!
//! `HostError` is the error type of every bridge operation. Each variant
//! belongs to exactly one [`ErrorClass`], and the guest only ever sees the
//! class, via [`to_errno`](HostError::to_errno). The variant detail is for
//! host-side logs.

use std::path::PathBuf;

use wasi_llm_primitives::{ErrNo, RawHandle, ResourceKind};

/// The two error classes that cross the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The hosting environment is misconfigured or the engine failed.
    Infra,
    /// The guest supplied a malformed request.
    GuestArgument,
}

/// Failure reported by the external training engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A backing file (checkpoint, data shard, vocabulary) does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Training stopped because the cancel flag was raised.
    #[error("training cancelled")]
    Cancelled,

    /// Any other engine failure.
    #[error("{0}")]
    Failed(String),
}

/// Host-side error returned by bridge operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The calling instance exports no linear memory.
    #[error("guest memory is not available")]
    MissingMemory,

    /// An engine factory or the training loop failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The handle counter of a table is used up.
    #[error("{0} handle space exhausted")]
    HandlesExhausted(ResourceKind),

    /// `[offset, offset+len)` is not fully inside guest memory.
    #[error("range {offset}+{len} outside guest memory of {memory_size} bytes")]
    OutOfBounds {
        offset: u32,
        len: u32,
        memory_size: usize,
    },

    /// A pointer that must reference a slot was zero.
    #[error("null pointer")]
    NullPointer,

    /// The handle is not present in the table of the expected kind.
    #[error("unknown {kind} handle {handle}")]
    UnknownHandle {
        kind: ResourceKind,
        handle: RawHandle,
    },

    /// The object is held by another in-flight training call.
    #[error("{kind} handle {handle} is busy")]
    Busy {
        kind: ResourceKind,
        handle: RawHandle,
    },

    /// The table of this kind holds its maximum number of objects.
    #[error("{kind} table is full ({limit} entries)")]
    TableFull { kind: ResourceKind, limit: usize },

    /// A scalar argument or a decoded path is unacceptable.
    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
}

impl HostError {
    /// The error class this failure is reported as.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingMemory | Self::Engine(_) | Self::HandlesExhausted(_) => ErrorClass::Infra,
            Self::OutOfBounds { .. }
            | Self::NullPointer
            | Self::UnknownHandle { .. }
            | Self::Busy { .. }
            | Self::TableFull { .. }
            | Self::InvalidArgument { .. } => ErrorClass::GuestArgument,
        }
    }

    /// Convert to the status returned to the WASM guest.
    pub fn to_errno(&self) -> ErrNo {
        match self.class() {
            ErrorClass::Infra => ErrNo::Internal,
            ErrorClass::GuestArgument => ErrNo::InvalidArgument,
        }
    }

    /// Create an invalid-argument error for `field`.
    pub fn invalid_argument(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidArgument { field, reason }
    }
}
