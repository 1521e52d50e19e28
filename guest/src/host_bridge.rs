//! Safe wrappers over the `wasi_llm` imports.
//!
//! Each wrapper marshals Rust values to pointer/length pairs, calls the
//! import, and checks the status. A create writes its handle into a local
//! slot that the host fills in.

use wasi_llm_primitives::{DataLoaderParams, ErrNo, RawHandle, TrainParams};

use crate::handles::{DataLoaderHandle, ModelHandle, TokenizerHandle};
use crate::imports;
use crate::status::check_status;

fn ptr<T>(p: *const T) -> u32 {
    p as usize as u32
}

/// Load a model checkpoint.
pub fn model_create(checkpoint: &str) -> Result<ModelHandle, ErrNo> {
    let mut out: RawHandle = 0;
    let code = unsafe {
        imports::model_create(
            ptr(checkpoint.as_ptr()),
            checkpoint.len() as u32,
            ptr(&mut out as *mut RawHandle),
        )
    };
    check_status(code)?;
    Ok(ModelHandle::from_raw(out))
}

/// Open a data loader over the token file at `path`.
pub fn dataloader_create(path: &str, params: &DataLoaderParams) -> Result<DataLoaderHandle, ErrNo> {
    let mut out: RawHandle = 0;
    let code = unsafe {
        imports::dataloader_create(
            ptr(path.as_ptr()),
            path.len() as u32,
            params.batch_size,
            params.seq_len,
            params.process_rank,
            params.num_processes,
            params.shuffle as i32,
            ptr(&mut out as *mut RawHandle),
        )
    };
    check_status(code)?;
    Ok(DataLoaderHandle::from_raw(out))
}

/// Load a tokenizer vocabulary.
pub fn tokenizer_create(vocab: &str) -> Result<TokenizerHandle, ErrNo> {
    let mut out: RawHandle = 0;
    let code = unsafe {
        imports::tokenizer_create(
            ptr(vocab.as_ptr()),
            vocab.len() as u32,
            ptr(&mut out as *mut RawHandle),
        )
    };
    check_status(code)?;
    Ok(TokenizerHandle::from_raw(out))
}

/// Train `model`. Blocks until the host's training run finishes.
pub fn model_train(
    model: &ModelHandle,
    train_loader: &DataLoaderHandle,
    val_loader: &DataLoaderHandle,
    tokenizer: &TokenizerHandle,
    params: &TrainParams,
) -> Result<(), ErrNo> {
    let code = unsafe {
        imports::model_train(
            ptr(model.slot()),
            ptr(train_loader.slot()),
            ptr(val_loader.slot()),
            ptr(tokenizer.slot()),
            params.learning_rate,
            params.epochs as f32,
        )
    };
    check_status(code)
}

pub fn model_free(model: ModelHandle) -> Result<(), ErrNo> {
    check_status(unsafe { imports::model_free(model.raw()) })
}

pub fn dataloader_free(loader: DataLoaderHandle) -> Result<(), ErrNo> {
    check_status(unsafe { imports::dataloader_free(loader.raw()) })
}

pub fn tokenizer_free(tokenizer: TokenizerHandle) -> Result<(), ErrNo> {
    check_status(unsafe { imports::tokenizer_free(tokenizer.raw()) })
}
