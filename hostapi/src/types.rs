//! Host-side configuration types for the `wasi_llm` bridge.
//!
//! `BridgeLimits` bundles the resource limits enforced on guest requests.

use serde::{Deserialize, Serialize};

/// Resource limits applied to every guest instance.
///
/// These limits are enforced by the handle tables and the path decoder.
/// The guest cannot exceed them.
///
/// `max_handles_per_kind` departs from an unbounded handle table on
/// purpose: once that many objects of a kind are live, `create` fails with
/// `TableFull` because of the table itself, and the guest sees an invalid
/// argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeLimits {
    /// Maximum number of live objects per resource kind.
    pub max_handles_per_kind: usize,
    /// Maximum length of a guest-supplied path in bytes.
    pub max_path_len: u32,
}

impl Default for BridgeLimits {
    fn default() -> Self {
        Self {
            max_handles_per_kind: 1024,
            max_path_len: 4096,
        }
    }
}
