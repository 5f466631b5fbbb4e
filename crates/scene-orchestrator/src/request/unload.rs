use crate::client::SceneClient;
use crate::error::SceneError;
use crate::message::{Command, UnloadPlan, UnloadTarget};
use crate::scene::SceneId;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

/// Builder for an unload request tree.
///
/// The target is resolved against the active scenes when the node runs, not
/// when the request is built. Sub-requests run after this node's own unload
/// has been confirmed by the loader.
pub struct UnloadRequest {
    client: SceneClient,
    plan: UnloadPlan,
}

impl UnloadRequest {
    pub(crate) fn by_name(client: SceneClient, name: impl Into<String>) -> Self {
        Self {
            client,
            plan: UnloadPlan::new(UnloadTarget::Name(name.into())),
        }
    }

    pub(crate) fn by_id(client: SceneClient, id: SceneId) -> Self {
        Self {
            client,
            plan: UnloadPlan::new(UnloadTarget::Id(id)),
        }
    }

    pub fn target(&self) -> &UnloadTarget {
        &self.plan.target
    }

    /// Appends a sub-request unloading the first active scene named `name`.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.plan
            .children
            .push(UnloadPlan::new(UnloadTarget::Name(name.into())));
        self
    }

    /// Appends a sub-request unloading scene `id`.
    pub fn with_id(mut self, id: SceneId) -> Self {
        self.plan.children.push(UnloadPlan::new(UnloadTarget::Id(id)));
        self
    }

    pub fn parallel(mut self) -> Self {
        self.plan.parallel = true;
        self
    }

    /// Called once with the unloaded scene id, after every sub-request has
    /// finished.
    pub fn on_complete<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(SceneId) + Send + 'static,
    {
        self.plan.on_complete = Some(Box::new(handler));
        self
    }

    pub fn on_fail<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(SceneError) + Send + 'static,
    {
        self.plan.on_fail = Some(Box::new(handler));
        self
    }

    #[instrument(skip_all, fields(target = %self.plan.target))]
    pub async fn apply(self) -> Result<(), SceneError> {
        debug!(children = self.plan.children.len(), "Sending request");
        self.client.send(Command::ApplyUnload(self.plan)).await
    }

    /// Applies the request and waits for its outcome.
    pub async fn apply_and_wait(mut self) -> Result<SceneId, SceneError> {
        let (done_tx, done_rx) = oneshot::channel();
        let (fail_tx, fail_rx) = oneshot::channel();

        let on_complete = self.plan.on_complete.take();
        self.plan.on_complete = Some(Box::new(move |id: SceneId| {
            if let Some(handler) = on_complete {
                handler(id);
            }
            let _ = done_tx.send(id);
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
            Ok(id) = done_rx => Ok(id),
            Ok(error) = fail_rx => Err(error),
            else => Err(SceneError::Abandoned),
        }
    }
}
