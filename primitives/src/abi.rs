//! The `wasi_llm` import ABI.
//!
//! All host functions are imported by the guest under [`HOST_MODULE`].
//! Pointers are `u32` offsets into the guest's linear memory, lengths are
//! `u32` byte counts, and every function returns an `i32` [`ErrNo`](crate::ErrNo).

/// Import module name used by guests.
pub const HOST_MODULE: &str = "wasi_llm";

pub const MODEL_CREATE: &str = "model_create";
pub const DATALOADER_CREATE: &str = "dataloader_create";
pub const TOKENIZER_CREATE: &str = "tokenizer_create";
pub const MODEL_TRAIN: &str = "model_train";
pub const MODEL_FREE: &str = "model_free";
pub const DATALOADER_FREE: &str = "dataloader_free";
pub const TOKENIZER_FREE: &str = "tokenizer_free";

/// Core wasm value types used by the ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    I32,
    F32,
}

/// Name and signature of one host function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFunction {
    pub name: &'static str,
    pub params: &'static [AbiType],
    pub result: AbiType,
}

use AbiType::{F32, I32};

/// Every function the bridge exports to guests.
pub const HOST_FUNCTIONS: &[HostFunction] = &[
    // (path_ptr, path_len, out_handle_ptr)
    HostFunction { name: MODEL_CREATE, params: &[I32, I32, I32], result: I32 },
    // (path_ptr, path_len, batch_size, seq_len, rank, num_processes, shuffle, out_handle_ptr)
    HostFunction {
        name: DATALOADER_CREATE,
        params: &[I32, I32, I32, I32, I32, I32, I32, I32],
        result: I32,
    },
    // (path_ptr, path_len, out_handle_ptr)
    HostFunction { name: TOKENIZER_CREATE, params: &[I32, I32, I32], result: I32 },
    // (model_ptr, train_loader_ptr, val_loader_ptr, tokenizer_ptr, learning_rate, epochs)
    HostFunction {
        name: MODEL_TRAIN,
        params: &[I32, I32, I32, I32, F32, F32],
        result: I32,
    },
    HostFunction { name: MODEL_FREE, params: &[I32], result: I32 },
    HostFunction { name: DATALOADER_FREE, params: &[I32], result: I32 },
    HostFunction { name: TOKENIZER_FREE, params: &[I32], result: I32 },
];

/// Look up a host function by import name.
pub fn find_host_function(name: &str) -> Option<&'static HostFunction> {
    HOST_FUNCTIONS.iter().find(|f| f.name == name)
}
