//! Shared test helpers for integration tests.
//!
//! Provides the in-memory engine setup, WAT guest builders, and bridge
//! factory functions used across all integration test files.

#![allow(dead_code)]

use std::sync::Arc;

use wasi_llm_bridge::{Bridge, BridgeConfig, TableSharing};
use wasi_llm_hostapi::MemEngine;

// ── Guest memory layout ──

/// Handle slots written by the create calls and read by `model_train`.
pub const MODEL_SLOT: u32 = 100;
pub const TRAIN_SLOT: u32 = 104;
pub const VAL_SLOT: u32 = 108;
pub const TOKENIZER_SLOT: u32 = 112;

/// Paths baked into the guest's data segments as `(offset, len)`.
pub const CKPT_PATH: (u32, u32) = (1024, 9);
pub const TRAIN_PATH: (u32, u32) = (1056, 10);
pub const VAL_PATH: (u32, u32) = (1088, 8);
pub const VOCAB_PATH: (u32, u32) = (1120, 11);

/// Every path the test engine knows.
pub const FILES: &[&str] = &["/ckpt.bin", "/train.bin", "/val.bin", "/vocab.json"];

const IMPORTS: &str = r#"
    (import "wasi_llm" "model_create" (func $model_create (param i32 i32 i32) (result i32)))
    (import "wasi_llm" "dataloader_create"
        (func $dataloader_create (param i32 i32 i32 i32 i32 i32 i32 i32) (result i32)))
    (import "wasi_llm" "tokenizer_create" (func $tokenizer_create (param i32 i32 i32) (result i32)))
    (import "wasi_llm" "model_train"
        (func $model_train (param i32 i32 i32 i32 f32 f32) (result i32)))
    (import "wasi_llm" "model_free" (func $model_free (param i32) (result i32)))
    (import "wasi_llm" "dataloader_free" (func $dataloader_free (param i32) (result i32)))
    (import "wasi_llm" "tokenizer_free" (func $tokenizer_free (param i32) (result i32)))
"#;

const MEMORY: &str = r#"
    (memory (export "memory") 1)
    (data (i32.const 1024) "/ckpt.bin")
    (data (i32.const 1056) "/train.bin")
    (data (i32.const 1088) "/val.bin")
    (data (i32.const 1120) "/vocab.json")
"#;

/// Exports covering every operation on the standard layout.
const STANDARD_FUNCS: &str = r#"
    (func (export "create_model") (result i32)
        (call $model_create (i32.const 1024) (i32.const 9) (i32.const 100)))
    (func (export "create_train_loader") (result i32)
        (call $dataloader_create (i32.const 1056) (i32.const 10)
            (i32.const 4) (i32.const 64) (i32.const 0) (i32.const 1) (i32.const 1)
            (i32.const 104)))
    (func (export "create_val_loader") (result i32)
        (call $dataloader_create (i32.const 1088) (i32.const 8)
            (i32.const 4) (i32.const 64) (i32.const 0) (i32.const 1) (i32.const 0)
            (i32.const 108)))
    (func (export "create_tokenizer") (result i32)
        (call $tokenizer_create (i32.const 1120) (i32.const 11) (i32.const 112)))
    (func (export "train") (result i32)
        (call $model_train (i32.const 100) (i32.const 104) (i32.const 108) (i32.const 112)
            (f32.const 0.0003) (f32.const 2)))
    (func (export "free_model") (result i32)
        (call $model_free (i32.load (i32.const 100))))
    (func (export "free_train_loader") (result i32)
        (call $dataloader_free (i32.load (i32.const 104))))
    (func (export "free_val_loader") (result i32)
        (call $dataloader_free (i32.load (i32.const 108))))
    (func (export "free_tokenizer") (result i32)
        (call $tokenizer_free (i32.load (i32.const 112))))
"#;

/// A guest with all imports, the standard memory layout, and `funcs`.
pub fn guest_with(funcs: &str) -> String {
    format!("(module {IMPORTS} {MEMORY} {STANDARD_FUNCS} {funcs})")
}

/// The standard guest without extra exports.
pub fn standard_guest() -> String {
    guest_with("")
}

/// A guest with all imports but no memory export.
pub fn memoryless_guest() -> String {
    format!(
        r#"(module {IMPORTS}
            (func (export "create_model") (result i32)
                (call $model_create (i32.const 0) (i32.const 9) (i32.const 100)))
            (func (export "create_train_loader") (result i32)
                (call $dataloader_create (i32.const 0) (i32.const 10)
                    (i32.const 4) (i32.const 64) (i32.const 0) (i32.const 1) (i32.const 0)
                    (i32.const 104)))
            (func (export "create_tokenizer") (result i32)
                (call $tokenizer_create (i32.const 0) (i32.const 11) (i32.const 112)))
            (func (export "train") (result i32)
                (call $model_train (i32.const 100) (i32.const 104) (i32.const 108) (i32.const 112)
                    (f32.const 0.0003) (f32.const 2)))
            (func (export "free_model") (result i32) (call $model_free (i32.const 0)))
            (func (export "free_train_loader") (result i32) (call $dataloader_free (i32.const 0)))
            (func (export "free_tokenizer") (result i32) (call $tokenizer_free (i32.const 0)))
        )"#
    )
}

// ── Bridge Factories ──

/// An engine that knows every path in [`FILES`].
pub fn test_engine() -> Arc<MemEngine> {
    Arc::new(MemEngine::with_files(FILES.iter().copied()))
}

/// Build a bridge for `wat` with the given config.
pub fn load_bridge_with_config(wat: &str, config: BridgeConfig) -> Bridge<MemEngine> {
    Bridge::new(wat, config, test_engine()).unwrap()
}

/// Build a bridge for the standard guest with default config.
pub fn load_bridge() -> Bridge<MemEngine> {
    load_bridge_with_config(&standard_guest(), BridgeConfig::default())
}

/// Build a bridge for the standard guest whose instances share tables.
pub fn load_shared_bridge() -> Bridge<MemEngine> {
    let config = BridgeConfig {
        table_sharing: TableSharing::Shared,
        ..BridgeConfig::default()
    };
    load_bridge_with_config(&standard_guest(), config)
}
