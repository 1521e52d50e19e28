//! Guest-invocable operations at the pointer level.
//!
//! Each operation resolves its pointer-shaped arguments against guest
//! memory first, in a fixed order, and fails on the first invalid one.
//! Only then does it create or look up handles and call the engine.
//! A rejected create registers nothing.

use std::path::PathBuf;

use tracing::{debug, error};
use wasi_llm_hostapi::{Handle, HostError, TrainingEngine};
use wasi_llm_primitives::{DataLoaderParams, RawHandle, TrainParams};

use crate::host_impl::{LlmContext, TrainHandles};
use crate::memory::{resolve_bytes, resolve_slot, GuestSlot};

/// Resolve and decode a guest path argument.
fn guest_path<E: TrainingEngine>(
    mem: &[u8],
    cx: &LlmContext<E>,
    ptr: u32,
    len: u32,
) -> Result<PathBuf, HostError> {
    if len > cx.limits().max_path_len {
        return Err(HostError::invalid_argument("path", "too long"));
    }
    let span = resolve_bytes(mem, ptr, len)?;
    cx.resolve_path(span.to_str()?)
}

/// Write a fresh handle back to the guest, undoing the create on failure.
fn write_back<T>(
    mem: &mut [u8],
    out: GuestSlot<u32>,
    handle: Handle<T>,
    release: impl FnOnce(Handle<T>) -> Result<(), HostError>,
) -> Result<RawHandle, HostError> {
    if let Err(e) = out.write(mem, handle.raw()) {
        if let Err(undo) = release(handle) {
            error!(handle = handle.raw(), error = %undo, "failed to undo create");
        }
        return Err(e);
    }
    Ok(handle.raw())
}

/// `model_create(path_ptr, path_len, out_handle_ptr)`
pub fn model_create<E: TrainingEngine>(
    mem: &mut [u8],
    cx: &LlmContext<E>,
    path_ptr: u32,
    path_len: u32,
    out_ptr: u32,
) -> Result<RawHandle, HostError> {
    let path = guest_path(mem, cx, path_ptr, path_len)?;
    let out = resolve_slot::<u32>(mem, out_ptr)?;

    let handle = cx.create_model(&path)?;
    debug!(handle = handle.raw(), path = %path.display(), "model created");
    write_back(mem, out, handle, |h| cx.release_model(h))
}

/// `dataloader_create(path_ptr, path_len, B, T, rank, num_processes, shuffle, out_handle_ptr)`
pub fn dataloader_create<E: TrainingEngine>(
    mem: &mut [u8],
    cx: &LlmContext<E>,
    path_ptr: u32,
    path_len: u32,
    params: &DataLoaderParams,
    out_ptr: u32,
) -> Result<RawHandle, HostError> {
    let path = guest_path(mem, cx, path_ptr, path_len)?;
    let out = resolve_slot::<u32>(mem, out_ptr)?;

    let handle = cx.create_data_loader(&path, params)?;
    debug!(handle = handle.raw(), path = %path.display(), "data loader created");
    write_back(mem, out, handle, |h| cx.release_data_loader(h))
}

/// `tokenizer_create(path_ptr, path_len, out_handle_ptr)`
pub fn tokenizer_create<E: TrainingEngine>(
    mem: &mut [u8],
    cx: &LlmContext<E>,
    path_ptr: u32,
    path_len: u32,
    out_ptr: u32,
) -> Result<RawHandle, HostError> {
    let path = guest_path(mem, cx, path_ptr, path_len)?;
    let out = resolve_slot::<u32>(mem, out_ptr)?;

    let handle = cx.create_tokenizer(&path)?;
    debug!(handle = handle.raw(), path = %path.display(), "tokenizer created");
    write_back(mem, out, handle, |h| cx.release_tokenizer(h))
}

/// `model_train(model_ptr, train_loader_ptr, val_loader_ptr, tokenizer_ptr, lr, epochs)`
///
/// The four handles are passed by reference: each pointer addresses a
/// `u32` slot holding the handle value.
pub fn model_train<E: TrainingEngine>(
    mem: &[u8],
    cx: &LlmContext<E>,
    model_ptr: u32,
    train_loader_ptr: u32,
    val_loader_ptr: u32,
    tokenizer_ptr: u32,
    params: &TrainParams,
) -> Result<(), HostError> {
    let model = resolve_slot::<u32>(mem, model_ptr)?;
    let train_loader = resolve_slot::<u32>(mem, train_loader_ptr)?;
    let val_loader = resolve_slot::<u32>(mem, val_loader_ptr)?;
    let tokenizer = resolve_slot::<u32>(mem, tokenizer_ptr)?;

    let handles = TrainHandles {
        model: Handle::from_raw(model.read(mem)?),
        train_loader: Handle::from_raw(train_loader.read(mem)?),
        val_loader: Handle::from_raw(val_loader.read(mem)?),
        tokenizer: Handle::from_raw(tokenizer.read(mem)?),
    };
    cx.train(&handles, params)
}

/// `model_free(handle)`
pub fn model_free<E: TrainingEngine>(cx: &LlmContext<E>, handle: RawHandle) -> Result<(), HostError> {
    cx.release_model(Handle::from_raw(handle))
}

/// `dataloader_free(handle)`
pub fn dataloader_free<E: TrainingEngine>(
    cx: &LlmContext<E>,
    handle: RawHandle,
) -> Result<(), HostError> {
    cx.release_data_loader(Handle::from_raw(handle))
}

/// `tokenizer_free(handle)`
pub fn tokenizer_free<E: TrainingEngine>(
    cx: &LlmContext<E>,
    handle: RawHandle,
) -> Result<(), HostError> {
    cx.release_tokenizer(Handle::from_raw(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wasi_llm_hostapi::{ErrorClass, MemEngine};
    use wasi_llm_primitives::ResourceKind;

    use crate::config::BridgeConfig;

    const PAGE: usize = 65536;

    fn context() -> LlmContext<MemEngine> {
        let engine = MemEngine::with_files([
            "/ckpt.bin",
            "/train.bin",
            "/val.bin",
            "/vocab.json",
            "/vocab2.json",
        ]);
        LlmContext::new(Arc::new(engine), &BridgeConfig::default())
    }

    fn put(mem: &mut [u8], offset: usize, bytes: &[u8]) -> (u32, u32) {
        mem[offset..offset + bytes.len()].copy_from_slice(bytes);
        (offset as u32, bytes.len() as u32)
    }

    fn read_u32(mem: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(mem[offset..offset + 4].try_into().unwrap())
    }

    fn loader_params() -> DataLoaderParams {
        DataLoaderParams {
            batch_size: 4,
            seq_len: 64,
            process_rank: 0,
            num_processes: 1,
            shuffle: false,
        }
    }

    #[test]
    fn test_tokenizer_scenario() {
        let cx = context();
        let mut mem = vec![0u8; PAGE];
        let (p, l) = put(&mut mem, 16, b"/vocab.json");
        assert_eq!(l, 11);

        let h0 = tokenizer_create(&mut mem, &cx, p, l, 100).unwrap();
        assert_eq!(h0, 0);
        assert_eq!(read_u32(&mem, 100), 0);

        let (p2, l2) = put(&mut mem, 32, b"/vocab2.json");
        let h1 = tokenizer_create(&mut mem, &cx, p2, l2, 200).unwrap();
        assert_eq!(h1, 1);
        assert_eq!(read_u32(&mem, 200), 1);

        let first = cx.tables().tokenizers.get(Handle::from_raw(0)).unwrap();
        assert_eq!(first.lock().vocab, PathBuf::from("/vocab.json"));
    }

    #[test]
    fn test_model_span_past_memory_end() {
        let cx = context();
        let mut mem = vec![0u8; 40];
        let err = model_create(&mut mem, &cx, 0, 50, 8).unwrap_err();
        assert_eq!(err.class(), ErrorClass::GuestArgument);
        assert_eq!(cx.tables().models.len(), 0);
    }

    #[test]
    fn test_null_out_slot_registers_nothing() {
        let cx = context();
        let mut mem = vec![0u8; 256];
        let (p, l) = put(&mut mem, 16, b"/ckpt.bin");
        let err = model_create(&mut mem, &cx, p, l, 0).unwrap_err();
        assert_eq!(err, HostError::NullPointer);
        assert!(cx.tables().models.is_empty());
    }

    #[test]
    fn test_out_slot_past_end_registers_nothing() {
        let cx = context();
        let mut mem = vec![0u8; 256];
        let (p, l) = put(&mut mem, 16, b"/vocab.json");
        assert!(tokenizer_create(&mut mem, &cx, p, l, 254).is_err());
        assert!(cx.tables().tokenizers.is_empty());
    }

    #[test]
    fn test_failed_write_back_undoes_create() {
        let cx = context();
        let mem = vec![0u8; 256];
        let handle = cx.create_model(std::path::Path::new("/ckpt.bin")).unwrap();

        // Slot resolved against a larger memory than the one written to.
        let out = resolve_slot::<u32>(&mem, 200).unwrap();
        let mut shrunk = vec![0u8; 64];
        let err = write_back(&mut shrunk, out, handle, |h| cx.release_model(h)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::GuestArgument);
        assert!(cx.tables().models.is_empty());

        // A failed undo still reports the write failure.
        let handle = cx.create_model(std::path::Path::new("/ckpt.bin")).unwrap();
        let err = write_back(&mut shrunk, out, handle, |h| {
            Err(HostError::UnknownHandle { kind: ResourceKind::Model, handle: h.raw() })
        })
        .unwrap_err();
        assert!(matches!(err, HostError::OutOfBounds { .. }));
    }

    #[test]
    fn test_same_path_distinct_models() {
        let cx = context();
        let mut mem = vec![0u8; 256];
        let (p, l) = put(&mut mem, 16, b"/ckpt.bin");
        let a = model_create(&mut mem, &cx, p, l, 100).unwrap();
        let b = model_create(&mut mem, &cx, p, l, 104).unwrap();
        assert_ne!(a, b);
        let ma = cx.tables().models.get(Handle::from_raw(a)).unwrap();
        let mb = cx.tables().models.get(Handle::from_raw(b)).unwrap();
        assert_ne!(ma.lock().id, mb.lock().id);
    }

    #[test]
    fn test_path_too_long() {
        let mut config = BridgeConfig::default();
        config.limits.max_path_len = 8;
        let cx = LlmContext::new(Arc::new(MemEngine::with_files(["/ckpt.bin"])), &config);
        let mut mem = vec![0u8; 256];
        let (p, l) = put(&mut mem, 16, b"/ckpt.bin");
        let err = model_create(&mut mem, &cx, p, l, 100).unwrap_err();
        assert_eq!(err.class(), ErrorClass::GuestArgument);
    }

    #[test]
    fn test_missing_file_is_infra() {
        let cx = context();
        let mut mem = vec![0u8; 256];
        let (p, l) = put(&mut mem, 16, b"/missing.bin");
        let err = model_create(&mut mem, &cx, p, l, 100).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Infra);
        assert_eq!(read_u32(&mem, 100), 0);
        assert!(cx.tables().models.is_empty());
    }

    /// Creates all four objects and stores their handles at 100..116.
    fn prepared() -> (LlmContext<MemEngine>, Vec<u8>) {
        let cx = context();
        let mut mem = vec![0u8; 1024];
        let (p, l) = put(&mut mem, 300, b"/ckpt.bin");
        model_create(&mut mem, &cx, p, l, 100).unwrap();
        let (p, l) = put(&mut mem, 400, b"/train.bin");
        dataloader_create(&mut mem, &cx, p, l, &loader_params(), 104).unwrap();
        let (p, l) = put(&mut mem, 500, b"/val.bin");
        dataloader_create(&mut mem, &cx, p, l, &loader_params(), 108).unwrap();
        let (p, l) = put(&mut mem, 600, b"/vocab.json");
        tokenizer_create(&mut mem, &cx, p, l, 112).unwrap();
        (cx, mem)
    }

    fn params() -> TrainParams {
        TrainParams { learning_rate: 1e-4, epochs: 2 }
    }

    #[test]
    fn test_train_reads_handles_by_reference() {
        let (cx, mem) = prepared();
        assert_eq!(read_u32(&mem, 104), 0);
        assert_eq!(read_u32(&mem, 108), 1);

        model_train(&mem, &cx, 100, 104, 108, 112, &params()).unwrap();
        let runs = cx.engine().runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].val_data, PathBuf::from("/val.bin"));
    }

    #[test]
    fn test_train_invalid_slot_each_position() {
        let (cx, mem) = prepared();
        let bad = [
            (0, 104, 108, 112),
            (100, 1022, 108, 112),
            (100, 104, u32::MAX, 112),
            (100, 104, 108, 0),
        ];
        for (m, t, v, k) in bad {
            let err = model_train(&mem, &cx, m, t, v, k, &params()).unwrap_err();
            assert_eq!(err.class(), ErrorClass::GuestArgument);
        }
        assert!(cx.engine().runs().is_empty());

        assert!(cx.tables().models.contains(Handle::from_raw(0)));
        assert!(cx.tables().data_loaders.contains(Handle::from_raw(0)));
        assert!(cx.tables().data_loaders.contains(Handle::from_raw(1)));
        assert!(cx.tables().tokenizers.contains(Handle::from_raw(0)));
    }

    #[test]
    fn test_train_unknown_handle_value() {
        let (cx, mut mem) = prepared();
        mem[112..116].copy_from_slice(&77u32.to_le_bytes());
        let err = model_train(&mem, &cx, 100, 104, 108, 112, &params()).unwrap_err();
        assert_eq!(
            err,
            HostError::UnknownHandle { kind: ResourceKind::Tokenizer, handle: 77 }
        );
        assert!(cx.engine().runs().is_empty());
    }

    #[test]
    fn test_free_then_train_fails() {
        let (cx, mem) = prepared();
        model_free(&cx, 0).unwrap();
        assert!(model_free(&cx, 0).is_err());
        assert!(model_train(&mem, &cx, 100, 104, 108, 112, &params()).is_err());
        dataloader_free(&cx, 1).unwrap();
        tokenizer_free(&cx, 0).unwrap();
        assert!(tokenizer_free(&cx, 5).is_err());
    }
}
