//! A loader that behaves like a small engine: loads and unloads finish after
//! a configurable delay, identities are assigned in order, and an
//! `Exclusive` load unloads every other scene before it reports itself.

use async_trait::async_trait;
use scene_orchestrator::{LoadMode, LoaderError, LoaderEvents, SceneId, SceneLoader};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    pub load_delay_ms: u64,
    pub unload_delay_ms: u64,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            load_delay_ms: 10,
            unload_delay_ms: 5,
        }
    }
}

#[derive(Clone)]
pub struct SimulatedLoader {
    events: LoaderEvents,
    config: SimulatedConfig,
    next_id: Arc<AtomicU64>,
    engine_scenes: Arc<Mutex<BTreeMap<SceneId, String>>>,
}

impl SimulatedLoader {
    pub fn new(events: LoaderEvents, config: SimulatedConfig) -> Self {
        Self {
            events,
            config,
            next_id: Arc::new(AtomicU64::new(1)),
            engine_scenes: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Scenes the engine currently holds, whether or not the runtime asked for them.
    pub fn engine_scenes(&self) -> Vec<(SceneId, String)> {
        self.engine_scenes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }

    /// Loads a scene behind the runtime's back, the way an engine loads its
    /// first scene at startup.
    pub async fn load_external(&self, name: &str) -> SceneId {
        let id = self.allocate(name);
        if let Err(e) = self.events.loaded(id, name, LoadMode::Additive).await {
            warn!(%id, error = %e, "Runtime gone before external load was reported");
        }
        id
    }

    fn allocate(&self, name: &str) -> SceneId {
        let id = SceneId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.engine_scenes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, name.to_string());
        id
    }

    fn release(&self, id: SceneId) -> Option<String> {
        self.engine_scenes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id)
    }
}

#[async_trait]
impl SceneLoader for SimulatedLoader {
    async fn load(&self, name: &str, mode: LoadMode) -> Result<(), LoaderError> {
        let loader = self.clone();
        let name = name.to_string();
        let delay = Duration::from_millis(self.config.load_delay_ms);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if mode == LoadMode::Exclusive {
                let others: Vec<SceneId> =
                    loader.engine_scenes().into_iter().map(|(id, _)| id).collect();
                for id in others {
                    loader.release(id);
                    if loader.events.unloaded(id).await.is_err() {
                        return;
                    }
                }
            }

            let id = loader.allocate(&name);
            debug!(%id, scene = %name, "Engine finished loading");
            if let Err(e) = loader.events.loaded(id, name, mode).await {
                warn!(%id, error = %e, "Runtime gone before load was reported");
            }
        });
        Ok(())
    }

    async fn unload(&self, id: SceneId) -> Result<(), LoaderError> {
        if !self
            .engine_scenes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&id)
        {
            return Err(LoaderError::Rejected(format!("{} is not loaded", id)));
        }

        let loader = self.clone();
        let delay = Duration::from_millis(self.config.unload_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loader.release(id);
            debug!(%id, "Engine finished unloading");
            if let Err(e) = loader.events.unloaded(id).await {
                warn!(%id, error = %e, "Runtime gone before unload was reported");
            }
        });
        Ok(())
    }
}
