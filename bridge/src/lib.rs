//! `wasi-llm-bridge`: Wasmtime host functions for the `wasi_llm` boundary.
//!
//! This crate lets a sandboxed WASM guest drive a native training engine
//! without ever holding a host pointer. It enforces:
//!
//! - **Span validation:** every `(offset, length)` must lie fully inside guest memory
//! - **Opaque handles:** engine objects live in host tables, the guest sees `u32`s
//! - **Fail-fast dispatch:** all arguments are validated before the engine is called
//! - **Two-tier status:** every failure is `InvalidArgument` or `Internal`, never a trap
//! - **Import validation:** `wasi_llm` imports must match the ABI exactly
//!
//! Embedders with their own store data call [`add_to_linker`]. The
//! [`Bridge`] runtime covers the common case of one guest module per bridge.

pub mod error;
pub mod config;
pub mod memory;
pub mod host_impl;
pub mod dispatch;
pub mod validation;
pub mod linker;
pub mod runtime;

pub use error::BridgeError;
pub use config::{BridgeConfig, TableSharing};
pub use host_impl::LlmContext;
pub use linker::add_to_linker;
pub use runtime::{Bridge, BridgeInstance};
