//! `wasi-llm-hostapi`: host-side contracts for the `wasi_llm` bridge.
//!
//! This crate defines everything the bridge needs that does not touch
//! wasmtime. It provides:
//!
//! - `TrainingEngine` trait: the boundary to the external training engine
//! - `HandleTable` / `HandleTables`: opaque-handle ownership of engine objects
//! - `HostError`: two-tier error type with `ErrNo` conversion
//! - `CancelFlag`: cooperative cancellation for long training runs
//! - `BridgeLimits`: resource limits for handle tables and guest paths
//! - `MemEngine`: in-memory `TrainingEngine` for testing

pub mod error;
pub mod types;
pub mod traits;
pub mod handle_table;
pub mod mem_engine;

// Re-export commonly used types at the crate root.
pub use error::{EngineError, ErrorClass, HostError};
pub use types::BridgeLimits;
pub use traits::{CancelFlag, TrainingEngine};
pub use handle_table::{Handle, HandleTable, HandleTables};
pub use mem_engine::MemEngine;
