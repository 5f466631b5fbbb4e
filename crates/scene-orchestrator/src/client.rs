//! # Scene Client
//!
//! [`SceneClient`] is the caller-facing handle to a running
//! [`SceneRuntime`](crate::runtime::SceneRuntime). It builds request trees and
//! answers queries over the active scenes. [`LoaderEvents`] is the handle a
//! loader uses to report finished loads and unloads.

use crate::error::SceneError;
use crate::message::{Command, PendingSnapshot};
use crate::request::{LoadRequest, UnloadRequest};
use crate::scene::{LoadMode, ResourceHandle, SceneId};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// A cloneable handle for building requests and querying scenes.
///
/// The runtime keeps running as long as at least one `SceneClient` exists.
#[derive(Clone)]
pub struct SceneClient {
    sender: mpsc::Sender<Command>,
}

impl SceneClient {
    pub fn new(sender: mpsc::Sender<Command>) -> Self {
        Self { sender }
    }

    /// Starts a load request tree rooted at `name`.
    pub fn load(&self, name: impl Into<String>, mode: LoadMode) -> LoadRequest {
        LoadRequest::new(self.clone(), name, mode)
    }

    /// Starts an unload request tree for the first active scene named `name`.
    pub fn unload(&self, name: impl Into<String>) -> UnloadRequest {
        UnloadRequest::by_name(self.clone(), name)
    }

    /// Starts an unload request tree for a known scene.
    pub fn unload_id(&self, id: SceneId) -> UnloadRequest {
        UnloadRequest::by_id(self.clone(), id)
    }

    /// One independent unload request per name. None of them is applied.
    pub fn unload_many<I, S>(&self, names: I) -> Vec<UnloadRequest>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(|name| self.unload(name)).collect()
    }

    /// Unloads every active scene carrying `tag` and returns the ids submitted.
    #[instrument(skip(self))]
    pub async fn unload_by_tag(&self, tag: &str) -> Result<Vec<SceneId>, SceneError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(Command::UnloadByTag {
            tag: tag.to_string(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| SceneError::RuntimeDropped)?
    }

    /// All active scenes in insertion order.
    pub async fn scenes(&self) -> Result<Vec<ResourceHandle>, SceneError> {
        let (respond_to, response) = oneshot::channel();
        self.send(Command::Scenes { respond_to }).await?;
        response.await.map_err(|_| SceneError::RuntimeDropped)?
    }

    #[instrument(skip(self))]
    pub async fn find(&self, id: SceneId) -> Result<Option<ResourceHandle>, SceneError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(Command::Find { id, respond_to }).await?;
        response.await.map_err(|_| SceneError::RuntimeDropped)?
    }

    #[instrument(skip(self))]
    pub async fn find_by_tag(&self, tag: &str) -> Result<Vec<ResourceHandle>, SceneError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.send(Command::FindByTag {
            tag: tag.to_string(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| SceneError::RuntimeDropped)?
    }

    /// Typed payload of an active scene.
    ///
    /// `Ok(None)` when the scene is not active or carries no payload;
    /// [`SceneError::PayloadType`] when the payload has another type.
    pub async fn data<T: Any + Send + Sync>(
        &self,
        id: SceneId,
    ) -> Result<Option<Arc<T>>, SceneError> {
        match self.find(id).await? {
            Some(handle) => handle.data::<T>(),
            None => Ok(None),
        }
    }

    /// Names and ids whose self-actions are waiting for the loader.
    pub async fn pending(&self) -> Result<PendingSnapshot, SceneError> {
        let (respond_to, response) = oneshot::channel();
        self.send(Command::Pending { respond_to }).await?;
        response.await.map_err(|_| SceneError::RuntimeDropped)?
    }

    /// Event handle for the loader serving this runtime.
    ///
    /// It does not keep the runtime alive, so a loader holding it never
    /// blocks shutdown.
    pub fn events(&self) -> LoaderEvents {
        LoaderEvents {
            sender: self.sender.downgrade(),
        }
    }

    pub(crate) async fn send(&self, command: Command) -> Result<(), SceneError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| SceneError::RuntimeClosed)
    }
}

/// Inbound loader events.
#[derive(Clone)]
pub struct LoaderEvents {
    sender: mpsc::WeakSender<Command>,
}

impl LoaderEvents {
    /// Reports that `name` finished loading as scene `id`.
    pub async fn loaded(
        &self,
        id: SceneId,
        name: impl Into<String>,
        mode: LoadMode,
    ) -> Result<(), SceneError> {
        self.deliver(Command::Loaded {
            id,
            name: name.into(),
            mode,
        })
        .await
    }

    /// Reports that scene `id` finished unloading.
    pub async fn unloaded(&self, id: SceneId) -> Result<(), SceneError> {
        self.deliver(Command::Unloaded { id }).await
    }

    async fn deliver(&self, command: Command) -> Result<(), SceneError> {
        let sender = self.sender.upgrade().ok_or(SceneError::RuntimeClosed)?;
        sender
            .send(command)
            .await
            .map_err(|_| SceneError::RuntimeClosed)
    }
}
