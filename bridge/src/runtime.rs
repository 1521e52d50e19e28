//! Bridge runtime: Wasmtime engine, module loading, and guest instances.
//!
//! The `Bridge` struct is the main entry point. It loads a WASM module,
//! validates its `wasi_llm` imports, and instantiates guests whose store
//! data is an [`LlmContext`].

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use wasmtime::{Config, Engine, Instance, Linker, Module, Store};

use wasi_llm_hostapi::{CancelFlag, HandleTables, TrainingEngine};

use crate::config::{BridgeConfig, TableSharing};
use crate::error::BridgeError;
use crate::host_impl::LlmContext;
use crate::linker::add_to_linker;
use crate::memory::{resolve_bytes, resolve_slot};
use crate::validation::validate_module;

/// A validated guest module bound to one training engine.
///
/// Each call to [`instantiate`](Self::instantiate) creates a fresh WASM
/// instance with its own store. With [`TableSharing::Shared`] all
/// instances see the same handle tables, owned by the `Bridge`.
pub struct Bridge<E: TrainingEngine> {
    engine: Engine,
    module: Module,
    config: BridgeConfig,
    training: Arc<E>,
    shared_tables: Option<Arc<HandleTables<E>>>,
}

impl<E: TrainingEngine> Bridge<E> {
    /// Create a bridge from WASM bytecode (or WAT text).
    ///
    /// Validates the module's imports before accepting.
    pub fn new(
        wasm_bytes: impl AsRef<[u8]>,
        config: BridgeConfig,
        training: Arc<E>,
    ) -> Result<Self, BridgeError> {
        let engine = create_engine()?;
        let module = Module::new(&engine, wasm_bytes)?;
        Self::build(engine, module, config, training)
    }

    /// Load from a `.wasm` file path.
    pub fn from_file(
        path: &Path,
        config: BridgeConfig,
        training: Arc<E>,
    ) -> Result<Self, BridgeError> {
        let engine = create_engine()?;
        let module = Module::from_file(&engine, path)?;
        Self::build(engine, module, config, training)
    }

    fn build(
        engine: Engine,
        module: Module,
        config: BridgeConfig,
        training: Arc<E>,
    ) -> Result<Self, BridgeError> {
        validate_module(&module)?;
        let shared_tables = match config.table_sharing {
            TableSharing::Shared => Some(Arc::new(HandleTables::new(&config.limits))),
            TableSharing::PerInstance => None,
        };
        Ok(Self {
            engine,
            module,
            config,
            training,
            shared_tables,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn training_engine(&self) -> &E {
        &self.training
    }

    /// The shared tables, when sharing is enabled.
    pub fn shared_tables(&self) -> Option<&HandleTables<E>> {
        self.shared_tables.as_deref()
    }

    /// Instantiate the guest with a fresh store.
    pub fn instantiate(&self) -> Result<BridgeInstance<E>, BridgeError> {
        let cx = match &self.shared_tables {
            Some(tables) => {
                LlmContext::with_tables(self.training.clone(), tables.clone(), &self.config)
            }
            None => LlmContext::new(self.training.clone(), &self.config),
        };
        let mut store = Store::new(&self.engine, cx);

        let mut linker = Linker::new(&self.engine);
        add_to_linker(&mut linker, store_context::<E>)?;

        let instance = linker.instantiate(&mut store, &self.module)?;
        debug!(sharing = ?self.config.table_sharing, "guest instantiated");
        Ok(BridgeInstance { store, instance })
    }
}

/// One running guest instance.
pub struct BridgeInstance<E: TrainingEngine> {
    store: Store<LlmContext<E>>,
    instance: Instance,
}

impl<E: TrainingEngine> BridgeInstance<E> {
    /// Call a guest export of type `() -> i32`.
    pub fn call(&mut self, export: &str) -> Result<i32, BridgeError> {
        let func = self
            .instance
            .get_typed_func::<(), i32>(&mut self.store, export)?;
        handle_trap(func.call(&mut self.store, ()))
    }

    pub fn context(&self) -> &LlmContext<E> {
        self.store.data()
    }

    /// Cancel flag observed by this instance's training runs.
    ///
    /// Clones may be raised from another thread while `call` blocks.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.store.data().cancel_flag()
    }

    /// Copy `len` bytes out of guest memory.
    pub fn read_bytes(&mut self, offset: u32, len: u32) -> Result<Vec<u8>, BridgeError> {
        let memory = self.memory()?;
        let data = memory.data(&self.store);
        let span = resolve_bytes(data, offset, len)
            .map_err(|e| BridgeError::MemoryError(e.to_string()))?;
        Ok(span.as_bytes().to_vec())
    }

    /// Read a little-endian `u32` from guest memory.
    pub fn read_u32(&mut self, offset: u32) -> Result<u32, BridgeError> {
        let memory = self.memory()?;
        let data = memory.data(&self.store);
        resolve_slot::<u32>(data, offset)
            .and_then(|slot| slot.read(data))
            .map_err(|e| BridgeError::MemoryError(e.to_string()))
    }

    /// Write a little-endian `u32` into guest memory.
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), BridgeError> {
        let memory = self.memory()?;
        let data = memory.data_mut(&mut self.store);
        resolve_slot::<u32>(data, offset)
            .and_then(|slot| slot.write(data, value))
            .map_err(|e| BridgeError::MemoryError(e.to_string()))
    }

    fn memory(&mut self) -> Result<wasmtime::Memory, BridgeError> {
        self.instance
            .get_memory(&mut self.store, "memory")
            .ok_or_else(|| BridgeError::MemoryError("no memory export".into()))
    }
}

fn store_context<E: TrainingEngine>(cx: &mut LlmContext<E>) -> &mut LlmContext<E> {
    cx
}

/// Create a Wasmtime engine for guest modules.
fn create_engine() -> Result<Engine, BridgeError> {
    let mut wasm_config = Config::new();
    wasm_config.wasm_threads(false);
    wasm_config.wasm_multi_memory(false);
    Ok(Engine::new(&wasm_config)?)
}

/// Handle a guest function call result, converting traps to BridgeError.
fn handle_trap<R>(result: Result<R, anyhow::Error>) -> Result<R, BridgeError> {
    result.map_err(|e| BridgeError::GuestTrapped(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasi_llm_hostapi::MemEngine;

    fn bridge(wat: &str, config: BridgeConfig) -> Result<Bridge<MemEngine>, BridgeError> {
        let engine = Arc::new(MemEngine::with_files(["/ckpt.bin"]));
        Bridge::new(wat, config, engine)
    }

    const CREATE_MODEL: &str = r#"
        (module
            (import "wasi_llm" "model_create" (func $create (param i32 i32 i32) (result i32)))
            (memory (export "memory") 1)
            (data (i32.const 16) "/ckpt.bin")
            (func (export "run") (result i32)
                (call $create (i32.const 16) (i32.const 9) (i32.const 64)))
        )
    "#;

    #[test]
    fn test_create_engine() {
        assert!(create_engine().is_ok());
    }

    #[test]
    fn test_bridge_rejects_empty_wasm() {
        let engine = Arc::new(MemEngine::new());
        assert!(Bridge::new(Vec::<u8>::new(), BridgeConfig::default(), engine).is_err());
    }

    #[test]
    fn test_bridge_rejects_bad_import() {
        let wat = r#"(module (import "wasi_llm" "model_train" (func (param i32) (result i32))))"#;
        let err = bridge(wat, BridgeConfig::default()).err().unwrap();
        assert!(matches!(err, BridgeError::ValidationError(_)));
    }

    #[test]
    fn test_instance_creates_model() {
        let bridge = bridge(CREATE_MODEL, BridgeConfig::default()).unwrap();
        let mut instance = bridge.instantiate().unwrap();
        assert_eq!(instance.call("run").unwrap(), 0);
        assert_eq!(instance.read_u32(64).unwrap(), 0);
        assert_eq!(instance.call("run").unwrap(), 0);
        assert_eq!(instance.read_u32(64).unwrap(), 1);
        assert_eq!(instance.context().tables().models.len(), 2);
        assert!(bridge.shared_tables().is_none());
    }

    #[test]
    fn test_read_and_write_memory() {
        let bridge = bridge(CREATE_MODEL, BridgeConfig::default()).unwrap();
        let mut instance = bridge.instantiate().unwrap();
        assert_eq!(instance.read_bytes(16, 9).unwrap(), b"/ckpt.bin");
        instance.write_u32(128, 42).unwrap();
        assert_eq!(instance.read_u32(128).unwrap(), 42);
        assert!(instance.read_u32(65534).is_err());
    }

    #[test]
    fn test_guest_trap_reported() {
        let wat = r#"(module (func (export "run") (result i32) unreachable))"#;
        let bridge = bridge(wat, BridgeConfig::default()).unwrap();
        let mut instance = bridge.instantiate().unwrap();
        let err = instance.call("run").unwrap_err();
        assert!(matches!(err, BridgeError::GuestTrapped(_)));
    }

    #[test]
    fn test_missing_export() {
        let bridge = bridge(CREATE_MODEL, BridgeConfig::default()).unwrap();
        let mut instance = bridge.instantiate().unwrap();
        assert!(matches!(instance.call("main"), Err(BridgeError::Wasmtime(_))));
    }
}
