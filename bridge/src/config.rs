//! Bridge configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use wasi_llm_hostapi::BridgeLimits;

/// Which instances see the same handle tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSharing {
    /// Every guest instance gets isolated tables, dropped with the instance.
    #[default]
    PerInstance,
    /// All instances of one `Bridge` share one set of tables.
    Shared,
}

/// Configuration for the `wasi_llm` bridge.
///
/// Controls table sharing, path resolution, and resource limits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Table sharing between guest instances.
    pub table_sharing: TableSharing,

    /// Directory guest paths are resolved against.
    /// `None` passes guest paths to the engine unchanged.
    pub path_root: Option<PathBuf>,

    /// Handle and path limits.
    pub limits: BridgeLimits,
}
