//! # Scene Orchestrator
//!
//! Request-tree orchestration for scenes that are loaded and unloaded by an
//! external, asynchronous loader.
//!
//! A caller describes a tree of operations: one scene to load (or unload)
//! plus ordered sub-requests that run after it, or alongside it. The
//! [`SceneRuntime`] forwards each node's own operation to the loader, matches
//! the loader's events back to the node that caused them, and fires each
//! node's completion handler exactly once, bottom-up, when the node and its
//! whole subtree are done.
//!
//! ## Architecture Overview
//!
//! 1. **Runtime Layer** ([`SceneRuntime`]) - one Tokio task owning the active
//!    scenes, the pending loads/unloads and every request node
//! 2. **Interface Layer** ([`SceneClient`], [`LoadRequest`], [`UnloadRequest`]) -
//!    request builders and queries
//! 3. **Collaborators** ([`SceneCatalog`], [`SceneLoader`], [`LoaderEvents`]) -
//!    supplied by the host engine and injected at `run()` time
//!
//! ```rust
//! use scene_orchestrator::mock::MockLoader;
//! use scene_orchestrator::{LoadMode, RuntimeContext, SceneId, SceneRuntime, StaticCatalog};
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Create the runtime and its client
//!     let (runtime, client) = SceneRuntime::new(32);
//!
//!     // 2. Wire collaborators and run
//!     let (loader, mut probe) = MockLoader::new();
//!     let events = client.events();
//!     tokio::spawn(runtime.run(RuntimeContext::new(StaticCatalog::new(["Level1"]), loader)));
//!
//!     // 3. Apply a request; the engine reports the load later
//!     let pending = tokio::spawn(client.load("Level1", LoadMode::Additive).apply_and_wait());
//!     probe.expect_call().await;
//!     events.loaded(SceneId(42), "Level1", LoadMode::Additive).await.unwrap();
//!
//!     let level = pending.await.unwrap().unwrap();
//!     assert_eq!(level.id, SceneId(42));
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Requests, loader events and queries share one channel and are handled
//!   in arrival order
//! - All registry mutation and completion bookkeeping happens inside the
//!   runtime task (no locks)
//! - The only suspension points inside the runtime are the loader's `load`
//!   and `unload` calls
//!
//! ## Testing
//!
//! The [`mock`] module provides a [`MockLoader`](mock::MockLoader) that
//! records forwarded calls and lets tests deliver loader events by hand.

pub mod client;
pub mod completion;
pub mod config;
pub mod error;
pub mod loader;
pub mod message;
pub mod mock;
pub mod registry;
pub mod request;
pub mod runtime;
pub mod scene;
pub mod tracing;

// Re-export core types for convenience
pub use client::{LoaderEvents, SceneClient};
pub use config::RuntimeConfig;
pub use error::{LoaderError, SceneError};
pub use loader::{SceneCatalog, SceneLoader, StaticCatalog};
pub use message::{PendingSnapshot, UnloadTarget};
pub use registry::ActiveRegistry;
pub use request::{LoadRequest, UnloadRequest};
pub use runtime::{RuntimeContext, SceneRuntime};
pub use scene::{LoadMode, LoadOrigin, ResourceHandle, SceneData, SceneId};
