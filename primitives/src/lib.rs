//! `wasi-llm-primitives`: foundational types for the `wasi_llm` boundary.
//!
//! This crate provides the status codes, resource kinds, training parameter
//! types, and import ABI shared by the host bridge and WASM guests.
//!
//! Supports `#![no_std]` for WASM guest compatibility (use `default-features = false`).

#![cfg_attr(not(feature = "std"), no_std)]

pub mod abi;
pub mod error;
pub mod types;

// Re-export commonly used types at the crate root for convenience.
pub use abi::{find_host_function, AbiType, HostFunction, HOST_FUNCTIONS, HOST_MODULE};
pub use error::ErrNo;
pub use types::{DataLoaderParams, RawHandle, ResourceKind, TrainParams};
