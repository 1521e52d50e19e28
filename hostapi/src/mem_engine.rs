//! In-memory training engine for testing.
//!
//! `MemEngine` implements `TrainingEngine` without touching the filesystem
//! or doing any numeric work. It knows a fixed set of "files"; constructing
//! an object from any other path fails like a missing backing file would.
//! Every training run is recorded so tests can observe what reached the
//! engine.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use wasi_llm_primitives::{DataLoaderParams, TrainParams};

use crate::error::EngineError;
use crate::traits::{CancelFlag, TrainingEngine};

#[derive(Debug, Clone, PartialEq)]
pub struct MemModel {
    /// Unique per constructed model, even for the same checkpoint.
    pub id: u64,
    pub checkpoint: PathBuf,
    /// Optimizer steps taken so far.
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemDataLoader {
    pub path: PathBuf,
    pub params: DataLoaderParams,
    pub batches_served: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemTokenizer {
    pub vocab: PathBuf,
}

/// One call to `run_training` that reached the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRun {
    pub model_id: u64,
    pub train_data: PathBuf,
    pub val_data: PathBuf,
    pub vocab: PathBuf,
    pub params: TrainParams,
    /// Epochs completed before the run ended.
    pub epochs_completed: u32,
}

/// In-memory `TrainingEngine` backed by a set of known paths.
#[derive(Debug, Default)]
pub struct MemEngine {
    files: BTreeSet<PathBuf>,
    next_model_id: AtomicU64,
    runs: Mutex<Vec<TrainingRun>>,
}

impl MemEngine {
    /// Create an engine that knows no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine pre-populated with the given paths.
    pub fn with_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Make `path` available to the factories.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.insert(path.into());
    }

    /// Every training run recorded so far, in call order.
    pub fn runs(&self) -> Vec<TrainingRun> {
        self.runs.lock().clone()
    }

    fn require(&self, path: &Path) -> Result<(), EngineError> {
        if self.files.contains(path) {
            Ok(())
        } else {
            Err(EngineError::NotFound(path.to_path_buf()))
        }
    }
}

impl TrainingEngine for MemEngine {
    type Model = MemModel;
    type DataLoader = MemDataLoader;
    type Tokenizer = MemTokenizer;

    fn construct_model(&self, checkpoint: &Path) -> Result<MemModel, EngineError> {
        self.require(checkpoint)?;
        Ok(MemModel {
            id: self.next_model_id.fetch_add(1, Ordering::Relaxed),
            checkpoint: checkpoint.to_path_buf(),
            steps: 0,
        })
    }

    fn construct_data_loader(
        &self,
        path: &Path,
        params: &DataLoaderParams,
    ) -> Result<MemDataLoader, EngineError> {
        self.require(path)?;
        Ok(MemDataLoader {
            path: path.to_path_buf(),
            params: *params,
            batches_served: 0,
        })
    }

    fn construct_tokenizer(&self, vocab: &Path) -> Result<MemTokenizer, EngineError> {
        self.require(vocab)?;
        Ok(MemTokenizer {
            vocab: vocab.to_path_buf(),
        })
    }

    fn run_training(
        &self,
        model: &mut MemModel,
        train_loader: &mut MemDataLoader,
        val_loader: &mut MemDataLoader,
        tokenizer: &MemTokenizer,
        params: &TrainParams,
        cancel: &CancelFlag,
    ) -> Result<(), EngineError> {
        let mut run = TrainingRun {
            model_id: model.id,
            train_data: train_loader.path.clone(),
            val_data: val_loader.path.clone(),
            vocab: tokenizer.vocab.clone(),
            params: *params,
            epochs_completed: 0,
        };

        let mut outcome = Ok(());
        for _ in 0..params.epochs {
            if cancel.is_cancelled() {
                outcome = Err(EngineError::Cancelled);
                break;
            }
            model.steps += 1;
            train_loader.batches_served += 1;
            val_loader.batches_served += 1;
            run.epochs_completed += 1;
        }

        self.runs.lock().push(run);
        outcome
    }
}
