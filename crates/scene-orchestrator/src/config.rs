//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`SceneRuntime`](crate::runtime::SceneRuntime).
///
/// Hosts usually embed this in their own configuration file; every field has
/// a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of the command channel. When it is full, client calls and
    /// loader events wait for space.
    pub buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}
