//! # Mock Loader
//!
//! Utilities for testing request trees without a real engine.
//!
//! [`MockLoader`] records every call the runtime forwards and never produces
//! events on its own: the test decides when (and whether) a load or unload
//! finishes by sending events through [`LoaderEvents`]. The paired
//! [`LoaderProbe`] lets the test await the next forwarded call and script
//! loader rejections.
//!
//! [`start_mock_runtime`] wires a runtime, a catalog and a mock loader
//! together:
//!
//! ```rust
//! use scene_orchestrator::mock::{start_mock_runtime, LoaderCall};
//! use scene_orchestrator::{LoadMode, SceneId, StaticCatalog};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut harness = start_mock_runtime(StaticCatalog::new(["Level1"]));
//!
//!     harness.client.load("Level1", LoadMode::Additive).apply().await.unwrap();
//!     assert_eq!(
//!         harness.probe.expect_call().await,
//!         LoaderCall::Load { name: "Level1".into(), mode: LoadMode::Additive }
//!     );
//!
//!     harness.events.loaded(SceneId(42), "Level1", LoadMode::Additive).await.unwrap();
//!     let scene = harness.client.find(SceneId(42)).await.unwrap().unwrap();
//!     assert_eq!(scene.name, "Level1");
//! }
//! ```

use crate::client::{LoaderEvents, SceneClient};
use crate::config::RuntimeConfig;
use crate::error::LoaderError;
use crate::loader::{SceneCatalog, SceneLoader};
use crate::runtime::{RuntimeContext, SceneRuntime};
use crate::scene::{LoadMode, SceneId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A call forwarded by the runtime to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderCall {
    Load { name: String, mode: LoadMode },
    Unload { id: SceneId },
}

#[derive(Default)]
struct Script {
    reject_loads: HashSet<String>,
    reject_unloads: HashSet<SceneId>,
}

/// Loader that records calls and reports nothing by itself.
pub struct MockLoader {
    history: Arc<Mutex<Vec<LoaderCall>>>,
    script: Arc<Mutex<Script>>,
    notify: mpsc::UnboundedSender<LoaderCall>,
}

/// Test-side view of a [`MockLoader`].
pub struct LoaderProbe {
    history: Arc<Mutex<Vec<LoaderCall>>>,
    script: Arc<Mutex<Script>>,
    calls: mpsc::UnboundedReceiver<LoaderCall>,
}

impl MockLoader {
    pub fn new() -> (Self, LoaderProbe) {
        let history = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(Script::default()));
        let (notify, calls) = mpsc::unbounded_channel();
        let loader = Self {
            history: history.clone(),
            script: script.clone(),
            notify,
        };
        let probe = LoaderProbe {
            history,
            script,
            calls,
        };
        (loader, probe)
    }

    fn record(&self, call: LoaderCall) {
        self.history.lock().unwrap().push(call.clone());
        let _ = self.notify.send(call);
    }
}

#[async_trait]
impl SceneLoader for MockLoader {
    async fn load(&self, name: &str, mode: LoadMode) -> Result<(), LoaderError> {
        self.record(LoaderCall::Load {
            name: name.to_string(),
            mode,
        });
        if self.script.lock().unwrap().reject_loads.contains(name) {
            return Err(LoaderError::Rejected(format!("load of {} refused", name)));
        }
        Ok(())
    }

    async fn unload(&self, id: SceneId) -> Result<(), LoaderError> {
        self.record(LoaderCall::Unload { id });
        if self.script.lock().unwrap().reject_unloads.contains(&id) {
            return Err(LoaderError::Unavailable);
        }
        Ok(())
    }
}

impl LoaderProbe {
    /// Makes every later `load` of `name` fail.
    pub fn reject_load(&self, name: &str) {
        self.script.lock().unwrap().reject_loads.insert(name.to_string());
    }

    /// Makes every later `unload` of `id` fail.
    pub fn reject_unload(&self, id: SceneId) {
        self.script.lock().unwrap().reject_unloads.insert(id);
    }

    /// Waits for the next forwarded call.
    ///
    /// # Panics
    /// If no call arrives within one second.
    pub async fn expect_call(&mut self) -> LoaderCall {
        match tokio::time::timeout(Duration::from_secs(1), self.calls.recv()).await {
            Ok(Some(call)) => call,
            Ok(None) => panic!("Mock loader dropped"),
            Err(_) => panic!("Expected a loader call, none arrived"),
        }
    }

    /// Next forwarded call if one was already made.
    pub fn try_next_call(&mut self) -> Option<LoaderCall> {
        self.calls.try_recv().ok()
    }

    /// Every call forwarded so far, in order.
    pub fn history(&self) -> Vec<LoaderCall> {
        self.history.lock().unwrap().clone()
    }
}

/// A runtime wired to a [`MockLoader`].
pub struct MockRuntime {
    pub client: SceneClient,
    pub events: LoaderEvents,
    pub probe: LoaderProbe,
    pub handle: JoinHandle<()>,
}

impl MockRuntime {
    /// Drops the client and waits for the runtime task to finish.
    pub async fn shutdown(self) {
        drop(self.client);
        let _ = self.handle.await;
    }
}

/// Spawns a runtime using `catalog` and a fresh [`MockLoader`].
pub fn start_mock_runtime(catalog: impl SceneCatalog) -> MockRuntime {
    let (runtime, client) = SceneRuntime::with_config(&RuntimeConfig::default());
    let (loader, probe) = MockLoader::new();
    let events = client.events();
    let handle = tokio::spawn(runtime.run(RuntimeContext::new(catalog, loader)));
    MockRuntime {
        client,
        events,
        probe,
        handle,
    }
}
