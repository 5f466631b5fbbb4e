//! # Loader Collaborators
//!
//! The runtime does not load anything itself. The host supplies two
//! collaborators through [`RuntimeContext`](crate::runtime::RuntimeContext):
//!
//! - [`SceneCatalog`] answers whether a name can be loaded at all.
//! - [`SceneLoader`] starts loads and unloads. Both calls are fire-and-forget:
//!   the loader later reports the outcome through
//!   [`LoaderEvents`](crate::client::LoaderEvents).
//!
//! A loader must deliver its events through the runtime queue and never block
//! on the runtime from inside `load`/`unload`; the runtime awaits these calls.

use crate::error::LoaderError;
use crate::scene::{LoadMode, SceneId};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

/// Existence check for load targets.
pub trait SceneCatalog: Send + Sync + 'static {
    fn exists(&self, name: &str) -> bool;
}

impl<F> SceneCatalog for F
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn exists(&self, name: &str) -> bool {
        self(name)
    }
}

/// Asynchronous scene loader.
///
/// Each accepted `load` eventually produces exactly one `loaded` event (or
/// none, timeouts are not modeled); each accepted `unload` produces exactly
/// one `unloaded` event. Returning an error means the loader refused to start
/// the operation, and no event will follow.
#[async_trait]
pub trait SceneLoader: Send + Sync + 'static {
    async fn load(&self, name: &str, mode: LoadMode) -> Result<(), LoaderError>;

    async fn unload(&self, id: SceneId) -> Result<(), LoaderError>;
}

/// A fixed set of loadable names, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    names: HashSet<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_lowercase());
    }
}

impl SceneCatalog for StaticCatalog {
    fn exists(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            warn!("Incorrect scene name");
            return false;
        }
        let found = self.names.contains(&name.to_lowercase());
        if !found {
            warn!(scene = %name, "Scene does not exist");
        }
        found
    }
}
