//! Bridge error types.

/// Top-level error type for the bridge crate.
///
/// Guests never see this type; it is returned to the embedding host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Wasmtime engine, compilation, linking, or instantiation error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// Module validation failed (unknown `wasi_llm` import, bad signature).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Memory access from the host side failed.
    #[error("memory error: {0}")]
    MemoryError(String),

    /// WASM guest trapped.
    #[error("guest trapped: {0}")]
    GuestTrapped(String),
}
