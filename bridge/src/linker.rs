//! Host function registration via Wasmtime linker.
//!
//! Registers all 7 `wasi_llm` functions with the Wasmtime `Linker`.
//! Each function:
//! 1. Extracts memory and the `LlmContext` from the Caller
//! 2. Hands both to the matching `dispatch` operation
//! 3. Logs the outcome
//! 4. Returns an i32 `ErrNo` (0 = success)
//!
//! No failure traps the guest; every failure is reported as a status code.

use tracing::{debug, error, warn};
use wasmtime::{Caller, Linker, Memory};

use wasi_llm_hostapi::{ErrorClass, HostError, TrainingEngine};
use wasi_llm_primitives::abi::{
    DATALOADER_CREATE, DATALOADER_FREE, MODEL_CREATE, MODEL_FREE, MODEL_TRAIN, TOKENIZER_CREATE,
    TOKENIZER_FREE,
};
use wasi_llm_primitives::{DataLoaderParams, ErrNo, TrainParams, HOST_MODULE};

use crate::dispatch;
use crate::error::BridgeError;
use crate::host_impl::LlmContext;

/// Projection from the store's data to the bridge context.
pub type GetContext<T, E> = fn(&mut T) -> &mut LlmContext<E>;

/// Get the guest's exported memory from a Caller.
fn guest_memory<T>(caller: &mut Caller<'_, T>) -> Result<Memory, HostError> {
    caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or(HostError::MissingMemory)
}

/// Run `op` with the guest's memory and the bridge context.
fn with_guest<T, E, R>(
    caller: &mut Caller<'_, T>,
    get_cx: GetContext<T, E>,
    op: impl FnOnce(&mut [u8], &LlmContext<E>) -> Result<R, HostError>,
) -> Result<R, HostError>
where
    E: TrainingEngine,
{
    let memory = guest_memory(caller)?;
    let (mem, data) = memory.data_and_store_mut(&mut *caller);
    op(mem, get_cx(data))
}

/// Log the outcome of one call and convert it to the guest status.
fn status<R>(op: &'static str, result: Result<R, HostError>) -> i32 {
    match result {
        Ok(_) => {
            debug!(op, "ok");
            ErrNo::Success.as_i32()
        }
        Err(e) => {
            match e.class() {
                ErrorClass::GuestArgument => warn!(op, error = %e, "rejected guest call"),
                ErrorClass::Infra => error!(op, error = %e, "host failure"),
            }
            e.to_errno().as_i32()
        }
    }
}

/// Register all `wasi_llm` functions with the linker.
///
/// `get_cx` projects the store's data to the bridge context, so embedders
/// can keep `LlmContext` inside their own state type.
pub fn add_to_linker<T, E>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError>
where
    T: 'static,
    E: TrainingEngine,
{
    register_model_create(linker, get_cx)?;
    register_dataloader_create(linker, get_cx)?;
    register_tokenizer_create(linker, get_cx)?;
    register_model_train(linker, get_cx)?;
    register_frees(linker, get_cx)?;
    Ok(())
}

// ── Creation ──

fn register_model_create<T: 'static, E: TrainingEngine>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError> {
    linker.func_wrap(
        HOST_MODULE,
        MODEL_CREATE,
        move |mut caller: Caller<'_, T>, path_ptr: u32, path_len: u32, out_ptr: u32| -> i32 {
            let result = with_guest(&mut caller, get_cx, |mem, cx| {
                dispatch::model_create(mem, cx, path_ptr, path_len, out_ptr)
            });
            status(MODEL_CREATE, result)
        },
    )?;
    Ok(())
}

fn register_dataloader_create<T: 'static, E: TrainingEngine>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError> {
    linker.func_wrap(
        HOST_MODULE,
        DATALOADER_CREATE,
        move |mut caller: Caller<'_, T>,
              path_ptr: u32,
              path_len: u32,
              batch_size: u32,
              seq_len: u32,
              process_rank: u32,
              num_processes: u32,
              shuffle: i32,
              out_ptr: u32|
              -> i32 {
            let params = DataLoaderParams {
                batch_size,
                seq_len,
                process_rank,
                num_processes,
                shuffle: shuffle != 0,
            };
            let result = with_guest(&mut caller, get_cx, |mem, cx| {
                dispatch::dataloader_create(mem, cx, path_ptr, path_len, &params, out_ptr)
            });
            status(DATALOADER_CREATE, result)
        },
    )?;
    Ok(())
}

fn register_tokenizer_create<T: 'static, E: TrainingEngine>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError> {
    linker.func_wrap(
        HOST_MODULE,
        TOKENIZER_CREATE,
        move |mut caller: Caller<'_, T>, path_ptr: u32, path_len: u32, out_ptr: u32| -> i32 {
            let result = with_guest(&mut caller, get_cx, |mem, cx| {
                dispatch::tokenizer_create(mem, cx, path_ptr, path_len, out_ptr)
            });
            status(TOKENIZER_CREATE, result)
        },
    )?;
    Ok(())
}

// ── Training ──

fn register_model_train<T: 'static, E: TrainingEngine>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError> {
    linker.func_wrap(
        HOST_MODULE,
        MODEL_TRAIN,
        move |mut caller: Caller<'_, T>,
              model_ptr: u32,
              train_loader_ptr: u32,
              val_loader_ptr: u32,
              tokenizer_ptr: u32,
              learning_rate: f32,
              epochs: f32|
              -> i32 {
            let result = with_guest(&mut caller, get_cx, |mem, cx| {
                let params = TrainParams::from_abi(learning_rate, epochs)
                    .map_err(|field| HostError::invalid_argument(field, "not a whole count"))?;
                dispatch::model_train(
                    mem,
                    cx,
                    model_ptr,
                    train_loader_ptr,
                    val_loader_ptr,
                    tokenizer_ptr,
                    &params,
                )
            });
            status(MODEL_TRAIN, result)
        },
    )?;
    Ok(())
}

// ── Release ──

fn register_frees<T: 'static, E: TrainingEngine>(
    linker: &mut Linker<T>,
    get_cx: GetContext<T, E>,
) -> Result<(), BridgeError> {
    linker.func_wrap(
        HOST_MODULE,
        MODEL_FREE,
        move |mut caller: Caller<'_, T>, handle: u32| -> i32 {
            let result = with_guest(&mut caller, get_cx, |_, cx| dispatch::model_free(cx, handle));
            status(MODEL_FREE, result)
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        DATALOADER_FREE,
        move |mut caller: Caller<'_, T>, handle: u32| -> i32 {
            let result =
                with_guest(&mut caller, get_cx, |_, cx| dispatch::dataloader_free(cx, handle));
            status(DATALOADER_FREE, result)
        },
    )?;
    linker.func_wrap(
        HOST_MODULE,
        TOKENIZER_FREE,
        move |mut caller: Caller<'_, T>, handle: u32| -> i32 {
            let result =
                with_guest(&mut caller, get_cx, |_, cx| dispatch::tokenizer_free(cx, handle));
            status(TOKENIZER_FREE, result)
        },
    )?;
    Ok(())
}
