//! # Orchestrator Errors
//!
//! This module defines the error types shared by the runtime, the request
//! builders and the loader collaborators.
//!
//! Failures of a request node are never returned from `apply()`: they are
//! delivered to the node's `on_fail` handler. `apply()` itself only fails when
//! the runtime task is gone.

use crate::scene::SceneId;

/// Errors reported by an external [`SceneLoader`](crate::loader::SceneLoader)
/// when it refuses to start a load or unload.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LoaderError {
    #[error("Loader rejected the request: {0}")]
    Rejected(String),
    #[error("Loader is unavailable")]
    Unavailable,
}

/// Errors produced by the scene orchestrator.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    /// A load name failed the existence check, or an unload target could not
    /// be resolved against the active scenes.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// A load for this name is already waiting for the loader.
    #[error("Load already pending: {0}")]
    AlreadyPending(String),

    /// The loader refused to start the self-action.
    #[error("Loader rejected {target}: {source}")]
    LoaderRejected {
        target: String,
        #[source]
        source: LoaderError,
    },

    /// Typed payload access with the wrong type.
    #[error("Scene {id} does not carry data of type {expected}")]
    PayloadType { id: SceneId, expected: &'static str },

    #[error("Runtime closed")]
    RuntimeClosed,
    #[error("Runtime dropped response channel")]
    RuntimeDropped,

    /// The request was discarded before it completed or failed.
    #[error("Request abandoned before completion")]
    Abandoned,
}
