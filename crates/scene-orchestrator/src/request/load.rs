use crate::client::SceneClient;
use crate::error::SceneError;
use crate::message::{Command, LoadPlan};
use crate::scene::{LoadMode, ResourceHandle, SceneData};
use std::any::Any;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

/// Builder for a load request tree.
///
/// Created by [`SceneClient::load`]. Sub-requests added with [`with`](Self::with)
/// or [`with_request`](Self::with_request) are always `Additive`.
pub struct LoadRequest {
    client: SceneClient,
    plan: LoadPlan,
}

impl LoadRequest {
    pub(crate) fn new(client: SceneClient, name: impl Into<String>, mode: LoadMode) -> Self {
        Self {
            client,
            plan: LoadPlan::new(name, mode),
        }
    }

    pub fn name(&self) -> &str {
        &self.plan.name
    }

    pub fn mode(&self) -> LoadMode {
        self.plan.mode
    }

    /// Appends an additive sub-request for `name`.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.plan.children.push(LoadPlan::new(name, LoadMode::Additive));
        self
    }

    /// Appends an additive sub-request for `name`, configured by `configure`.
    ///
    /// The sub-request is started by its parent; `configure` should only
    /// describe it.
    pub fn with_request<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(LoadRequest) -> LoadRequest,
    {
        let child = configure(LoadRequest::new(
            self.client.clone(),
            name,
            LoadMode::Additive,
        ));
        self.plan.children.push(child.plan);
        self
    }

    /// Adds tags to the resulting scene. Duplicates are ignored.
    pub fn tag<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.plan.tags.contains(&tag) {
                self.plan.tags.push(tag);
            }
        }
        self
    }

    /// Attaches a payload that sub-requests without their own payload inherit.
    pub fn data<T: Any + Send + Sync>(self, value: T) -> Self {
        self.data_with(value, true)
    }

    /// Attaches a payload; `propagate` decides whether sub-requests without
    /// their own payload inherit it.
    pub fn data_with<T: Any + Send + Sync>(self, value: T, propagate: bool) -> Self {
        self.payload(SceneData::new(value), propagate)
    }

    /// Attaches an already shared payload.
    pub fn payload(mut self, data: SceneData, propagate: bool) -> Self {
        self.plan.payload = Some(data);
        self.plan.propagate_data = propagate;
        self
    }

    /// Runs the sub-requests concurrently instead of one after the other.
    pub fn parallel(mut self) -> Self {
        self.plan.parallel = true;
        self
    }

    /// Called once, after this scene and every sub-request have finished.
    /// Replaces a handler set earlier.
    pub fn on_complete<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(ResourceHandle) + Send + 'static,
    {
        self.plan.on_complete = Some(Box::new(handler));
        self
    }

    /// Called once if this scene cannot be loaded. Replaces a handler set
    /// earlier.
    pub fn on_fail<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(SceneError) + Send + 'static,
    {
        self.plan.on_fail = Some(Box::new(handler));
        self
    }

    /// Seals the request and hands it to the runtime.
    ///
    /// Returns once the runtime has accepted the tree; the outcome is reported
    /// through `on_complete` / `on_fail`.
    #[instrument(skip_all, fields(scene = %self.plan.name))]
    pub async fn apply(self) -> Result<(), SceneError> {
        debug!(mode = ?self.plan.mode, children = self.plan.children.len(), "Sending request");
        self.client.send(Command::ApplyLoad(self.plan)).await
    }

    /// Applies the request and waits for its outcome.
    ///
    /// Handlers registered earlier still run before this returns.
    pub async fn apply_and_wait(mut self) -> Result<ResourceHandle, SceneError> {
        let (done_tx, done_rx) = oneshot::channel();
        let (fail_tx, fail_rx) = oneshot::channel();

        let on_complete = self.plan.on_complete.take();
        self.plan.on_complete = Some(Box::new(move |handle: ResourceHandle| {
            if let Some(handler) = on_complete {
                handler(handle.clone());
            }
            let _ = done_tx.send(handle);
        }));
        let on_fail = self.plan.on_fail.take();
        self.plan.on_fail = Some(Box::new(move |error: SceneError| {
            if let Some(handler) = on_fail {
                handler(error.clone());
            }
            let _ = fail_tx.send(error);
        }));

        self.apply().await?;
        tokio::select! {
            Ok(handle) = done_rx => Ok(handle),
            Ok(error) = fail_rx => Err(error),
            else => Err(SceneError::Abandoned),
        }
    }
}
