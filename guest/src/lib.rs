//! `wasi-llm-guest`: guest-side bindings for the `wasi_llm` imports.
//!
//! Guests compiled to `wasm32` call [`model_create`], [`dataloader_create`],
//! [`tokenizer_create`] and [`model_train`] instead of the raw imports.
//! Each returns a typed handle or an [`ErrNo`] so guests never juggle raw
//! pointers or status integers.
//!
//! Handles are not `Copy`: releasing one consumes it, so a released
//! handle cannot be passed again from safe code.

#![cfg_attr(not(test), no_std)]

mod handles;
mod status;

#[cfg(target_arch = "wasm32")]
mod imports;
#[cfg(target_arch = "wasm32")]
mod host_bridge;

pub use handles::{DataLoaderHandle, ModelHandle, TokenizerHandle};
pub use status::check_status;
pub use wasi_llm_primitives::{DataLoaderParams, ErrNo, TrainParams};

#[cfg(target_arch = "wasm32")]
pub use host_bridge::{
    dataloader_create, dataloader_free, model_create, model_free, model_train, tokenizer_create,
    tokenizer_free,
};
