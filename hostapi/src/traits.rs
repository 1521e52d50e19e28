//! Training engine trait: the boundary to the external training engine.
//!
//! The bridge never implements model construction, batching, tokenization,
//! or the training loop. It calls an implementation of [`TrainingEngine`]
//! with validated, host-owned arguments only.
//!
//! This trait works with Rust paths and references, not raw WASM pointers.
//! Pointer validation happens in the bridge crate.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wasi_llm_primitives::{DataLoaderParams, TrainParams};

use crate::error::EngineError;

/// Host-side implementation of the training engine.
///
/// The associated types are the native objects the bridge keeps in its
/// handle tables. Each lives in exactly one table and is only reachable
/// by the guest through an opaque handle.
pub trait TrainingEngine: Send + Sync + 'static {
    type Model: Send + 'static;
    type DataLoader: Send + 'static;
    type Tokenizer: Send + 'static;

    /// Construct a model from a checkpoint file.
    fn construct_model(&self, checkpoint: &Path) -> Result<Self::Model, EngineError>;

    /// Construct a data loader over the token shards at `path`.
    fn construct_data_loader(
        &self,
        path: &Path,
        params: &DataLoaderParams,
    ) -> Result<Self::DataLoader, EngineError>;

    /// Construct a tokenizer from a vocabulary file.
    fn construct_tokenizer(&self, vocab: &Path) -> Result<Self::Tokenizer, EngineError>;

    /// Run the training loop until the epoch budget is spent.
    ///
    /// Blocks the calling thread for the whole run. Implementations should
    /// check `cancel` at iteration boundaries and return
    /// `Err(EngineError::Cancelled)` once it is raised.
    fn run_training(
        &self,
        model: &mut Self::Model,
        train_loader: &mut Self::DataLoader,
        val_loader: &mut Self::DataLoader,
        tokenizer: &Self::Tokenizer,
        params: &TrainParams,
        cancel: &CancelFlag,
    ) -> Result<(), EngineError>;
}

/// Cooperative cancellation signal for long-running training.
///
/// Clones share the same flag. The flag stays raised until [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask any training observing this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Lower the flag so subsequent training runs proceed.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
