//! Per-instance bridge state held in the Wasmtime `Store`.
//!
//! `LlmContext` is created when a guest module is instantiated and dropped
//! with it. It is passed explicitly to every operation; nothing lives in a
//! global. Its methods take validated host values (paths, typed handles),
//! never raw guest offsets.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use wasi_llm_hostapi::{
    BridgeLimits, CancelFlag, Handle, HandleTables, HostError, TrainingEngine,
};
use wasi_llm_primitives::{DataLoaderParams, ResourceKind, TrainParams};

use crate::config::BridgeConfig;

pub type ModelHandle<E> = Handle<<E as TrainingEngine>::Model>;
pub type DataLoaderHandle<E> = Handle<<E as TrainingEngine>::DataLoader>;
pub type TokenizerHandle<E> = Handle<<E as TrainingEngine>::Tokenizer>;

/// The four handles a training call works on.
pub struct TrainHandles<E: TrainingEngine> {
    pub model: ModelHandle<E>,
    pub train_loader: DataLoaderHandle<E>,
    pub val_loader: DataLoaderHandle<E>,
    pub tokenizer: TokenizerHandle<E>,
}

/// Bridge state for one guest instance.
pub struct LlmContext<E: TrainingEngine> {
    engine: Arc<E>,
    tables: Arc<HandleTables<E>>,
    path_root: Option<PathBuf>,
    limits: BridgeLimits,
    cancel: CancelFlag,
}

impl<E: TrainingEngine> LlmContext<E> {
    /// Create a context with its own, empty handle tables.
    pub fn new(engine: Arc<E>, config: &BridgeConfig) -> Self {
        let tables = Arc::new(HandleTables::new(&config.limits));
        Self::with_tables(engine, tables, config)
    }

    /// Create a context over existing tables, shared with other instances.
    pub fn with_tables(engine: Arc<E>, tables: Arc<HandleTables<E>>, config: &BridgeConfig) -> Self {
        Self {
            engine,
            tables,
            path_root: config.path_root.clone(),
            limits: config.limits.clone(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tables(&self) -> &HandleTables<E> {
        &self.tables
    }

    pub fn limits(&self) -> &BridgeLimits {
        &self.limits
    }

    /// Cancel flag observed by training runs of this instance.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Map a decoded guest path to the path handed to the engine.
    ///
    /// With a configured root the guest path is taken relative to it and
    /// may not climb out with `..`.
    pub fn resolve_path(&self, guest_path: &str) -> Result<PathBuf, HostError> {
        let Some(root) = &self.path_root else {
            return Ok(PathBuf::from(guest_path));
        };
        let mut resolved = root.clone();
        for component in Path::new(guest_path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(HostError::invalid_argument("path", "escapes the path root"));
                }
            }
        }
        if resolved == *root {
            return Err(HostError::invalid_argument("path", "names the path root"));
        }
        Ok(resolved)
    }

    pub fn create_model(&self, checkpoint: &Path) -> Result<ModelHandle<E>, HostError> {
        self.tables
            .models
            .create(|| self.engine.construct_model(checkpoint))
    }

    pub fn create_data_loader(
        &self,
        path: &Path,
        params: &DataLoaderParams,
    ) -> Result<DataLoaderHandle<E>, HostError> {
        params
            .validate()
            .map_err(|field| HostError::invalid_argument(field, "out of range"))?;
        self.tables
            .data_loaders
            .create(|| self.engine.construct_data_loader(path, params))
    }

    pub fn create_tokenizer(&self, vocab: &Path) -> Result<TokenizerHandle<E>, HostError> {
        self.tables
            .tokenizers
            .create(|| self.engine.construct_tokenizer(vocab))
    }

    /// Run training on four resolved handles. Blocks until the engine returns.
    ///
    /// Every handle is looked up and every object locked before the engine
    /// is called; a half-resolved call never reaches it.
    pub fn train(&self, handles: &TrainHandles<E>, params: &TrainParams) -> Result<(), HostError> {
        params
            .validate()
            .map_err(|field| HostError::invalid_argument(field, "out of range"))?;

        let model = self.tables.models.get(handles.model)?;
        let train_loader = self.tables.data_loaders.get(handles.train_loader)?;
        let val_loader = self.tables.data_loaders.get(handles.val_loader)?;
        let tokenizer = self.tables.tokenizers.get(handles.tokenizer)?;

        if handles.train_loader == handles.val_loader {
            return Err(HostError::invalid_argument(
                "val_loader",
                "same data loader as train_loader",
            ));
        }

        let busy = |kind, handle: u32| HostError::Busy { kind, handle };
        let mut model = model
            .try_lock()
            .ok_or_else(|| busy(ResourceKind::Model, handles.model.raw()))?;
        let mut train_loader = train_loader
            .try_lock()
            .ok_or_else(|| busy(ResourceKind::DataLoader, handles.train_loader.raw()))?;
        let mut val_loader = val_loader
            .try_lock()
            .ok_or_else(|| busy(ResourceKind::DataLoader, handles.val_loader.raw()))?;
        let tokenizer = tokenizer
            .try_lock()
            .ok_or_else(|| busy(ResourceKind::Tokenizer, handles.tokenizer.raw()))?;

        info!(
            model = handles.model.raw(),
            learning_rate = params.learning_rate,
            epochs = params.epochs,
            "training started"
        );
        self.engine.run_training(
            &mut model,
            &mut train_loader,
            &mut val_loader,
            &tokenizer,
            params,
            &self.cancel,
        )?;
        info!(model = handles.model.raw(), "training finished");
        Ok(())
    }

    pub fn release_model(&self, handle: ModelHandle<E>) -> Result<(), HostError> {
        self.tables.models.release(handle)
    }

    pub fn release_data_loader(&self, handle: DataLoaderHandle<E>) -> Result<(), HostError> {
        self.tables.data_loaders.release(handle)
    }

    pub fn release_tokenizer(&self, handle: TokenizerHandle<E>) -> Result<(), HostError> {
        self.tables.tokenizers.release(handle)
    }
}
