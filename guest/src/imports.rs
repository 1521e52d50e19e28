//! Host function imports.
//!
//! All host functions are imported under the `wasi_llm` WASM module.
//! Each function returns an `i32` status (0 = success, see `ErrNo`).
//! Pointers are offsets into this module's linear memory.

#[link(wasm_import_module = "wasi_llm")]
extern "C" {
    // ── Creation ──

    /// Load a model checkpoint. Writes the new handle to `out_handle_ptr`.
    pub fn model_create(path_ptr: u32, path_len: u32, out_handle_ptr: u32) -> i32;

    /// Open a data loader. `shuffle` is a boolean (non-zero = true).
    pub fn dataloader_create(
        path_ptr: u32,
        path_len: u32,
        batch_size: u32,
        seq_len: u32,
        process_rank: u32,
        num_processes: u32,
        shuffle: i32,
        out_handle_ptr: u32,
    ) -> i32;

    /// Load a tokenizer vocabulary. Writes the new handle to `out_handle_ptr`.
    pub fn tokenizer_create(path_ptr: u32, path_len: u32, out_handle_ptr: u32) -> i32;

    // ── Training ──

    /// Train a model. The four pointers address `u32` handle slots.
    /// Blocks until training finishes.
    pub fn model_train(
        model_ptr: u32,
        train_loader_ptr: u32,
        val_loader_ptr: u32,
        tokenizer_ptr: u32,
        learning_rate: f32,
        epochs: f32,
    ) -> i32;

    // ── Release ──

    pub fn model_free(handle: u32) -> i32;

    pub fn dataloader_free(handle: u32) -> i32;

    pub fn tokenizer_free(handle: u32) -> i32;
}
