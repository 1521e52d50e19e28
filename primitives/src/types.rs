//! Resource kinds and the scalar parameter bundles passed to the training engine.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The raw `u32` value of a handle as seen by the guest.
pub type RawHandle = u32;

/// Kinds of host-owned objects a guest can reference by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Model,
    DataLoader,
    Tokenizer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::DataLoader => write!(f, "data loader"),
            Self::Tokenizer => write!(f, "tokenizer"),
        }
    }
}

/// Batching parameters for a data loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLoaderParams {
    /// Sequences per batch (B).
    pub batch_size: u32,
    /// Tokens per sequence (T).
    pub seq_len: u32,
    /// Rank of this process in a distributed run.
    pub process_rank: u32,
    /// Total number of processes in the run.
    pub num_processes: u32,
    /// Shuffle the shards between epochs.
    pub shuffle: bool,
}

impl DataLoaderParams {
    /// Check the batching parameters for internal consistency.
    ///
    /// Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.batch_size == 0 {
            return Err("batch_size");
        }
        if self.seq_len == 0 {
            return Err("seq_len");
        }
        if self.num_processes == 0 {
            return Err("num_processes");
        }
        if self.process_rank >= self.num_processes {
            return Err("process_rank");
        }
        Ok(())
    }
}

/// Optimization parameters for one training call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub learning_rate: f32,
    pub epochs: u32,
}

/// Largest `f32` epoch count that converts to `u32` without saturating.
const MAX_ABI_EPOCHS: f32 = 4_294_967_040.0;

impl TrainParams {
    /// Build parameters from the wire values of `model_train`.
    ///
    /// Epochs cross the ABI as an `f32` and must hold a whole,
    /// non-negative count. Returns the name of the offending field.
    pub fn from_abi(learning_rate: f32, epochs: f32) -> Result<Self, &'static str> {
        if !(0.0..=MAX_ABI_EPOCHS).contains(&epochs) {
            return Err("epochs");
        }
        let whole = epochs as u32;
        if whole as f32 != epochs {
            return Err("epochs");
        }
        Ok(Self { learning_rate, epochs: whole })
    }

    /// Check that the learning rate is finite and positive and that at
    /// least one epoch is requested.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate");
        }
        if self.epochs == 0 {
            return Err("epochs");
        }
        Ok(())
    }
}
