//! # System Lifecycle
//!
//! Starts a [`SceneRuntime`](scene_orchestrator::SceneRuntime) together with
//! the engine-side collaborators it needs, and shuts both down again.
//!
//! ## Wiring
//!
//! The runtime and the loader depend on each other: the runtime calls the
//! loader, and the loader reports back through the runtime's channel. The
//! cycle is broken with late binding:
//!
//! ```rust,ignore
//! // 1. Create the runtime (no collaborators yet)
//! let (runtime, client) = SceneRuntime::with_config(&config.runtime);
//!
//! // 2. Build the loader around the runtime's event handle
//! let loader = SimulatedLoader::new(client.events(), config.loader.clone());
//!
//! // 3. Inject collaborators at run() time
//! let handle = tokio::spawn(runtime.run(RuntimeContext::new(catalog, loader.clone())));
//! ```
//!
//! ## Graceful Shutdown
//!
//! [`LoaderEvents`](scene_orchestrator::LoaderEvents) holds only a weak
//! reference to the runtime's channel, so the loader never keeps the runtime
//! alive. Dropping the [`SceneSystem`]'s client closes the channel; the
//! runtime abandons whatever is still pending and exits.

pub mod scene_system;

pub use scene_system::*;
