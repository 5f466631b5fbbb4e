use crate::simulated::{SimulatedConfig, SimulatedLoader};
use scene_orchestrator::{
    RuntimeConfig, RuntimeContext, SceneClient, SceneError, SceneRuntime, StaticCatalog,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Runtime task failed: {0}")]
    RuntimeFailed(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Settings for a whole [`SceneSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub runtime: RuntimeConfig,
    pub loader: SimulatedConfig,
    /// Scene names the catalog knows about.
    pub scenes: Vec<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            loader: SimulatedConfig::default(),
            scenes: ["Bootstrap", "MainMenu", "Level1", "Level2", "Hud", "Audio"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// A running scene runtime wired to a [`SimulatedLoader`].
///
/// # Example
///
/// ```ignore
/// let system = SceneSystem::new(SystemConfig::default());
///
/// let level = system
///     .client
///     .load("Level1", LoadMode::Exclusive)
///     .with("Hud")
///     .apply_and_wait()
///     .await?;
///
/// system.shutdown().await?;
/// ```
pub struct SceneSystem {
    /// Client for requests and queries
    pub client: SceneClient,

    /// The engine side, for loading scenes outside the runtime
    pub loader: SimulatedLoader,

    handle: tokio::task::JoinHandle<()>,
}

impl SceneSystem {
    /// Creates the runtime and loader and spawns the runtime task.
    pub fn new(config: SystemConfig) -> Self {
        // 1. Create the runtime (no collaborators)
        let (runtime, client) = SceneRuntime::with_config(&config.runtime);

        // 2. The loader reports back through the runtime's event handle
        let loader = SimulatedLoader::new(client.events(), config.loader);
        let catalog = StaticCatalog::new(config.scenes);

        // 3. Start the runtime with injected collaborators
        let handle = tokio::spawn(runtime.run(RuntimeContext::new(catalog, loader.clone())));

        Self {
            client,
            loader,
            handle,
        }
    }

    /// Closes the runtime's channel and waits for the task to finish.
    ///
    /// Requests still pending are abandoned. Returns an error if the runtime
    /// task panicked.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down scene system...");

        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Runtime task failed: {:?}", e);
            return Err(SystemError::RuntimeFailed(e.to_string()));
        }

        info!("Scene system shutdown complete.");
        Ok(())
    }
}
