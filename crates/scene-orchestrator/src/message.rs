//! # Runtime Messages
//!
//! Everything that reaches the [`SceneRuntime`](crate::runtime::SceneRuntime)
//! travels as a [`Command`] on one `mpsc` channel: applied request trees,
//! inbound loader events and queries. The runtime handles them strictly in
//! arrival order.
//!
//! Request builders are turned into plans ([`LoadPlan`], [`UnloadPlan`]) when
//! applied. A plan is plain data plus the terminal callbacks; it no longer
//! holds a client, so pending requests do not keep the runtime alive.

use crate::error::SceneError;
use crate::scene::{LoadMode, ResourceHandle, SceneData, SceneId};
use std::fmt;
use std::time::SystemTime;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by queries.
pub type Response<T> = oneshot::Sender<Result<T, SceneError>>;

pub type OnLoaded = Box<dyn FnOnce(ResourceHandle) + Send>;
pub type OnUnloaded = Box<dyn FnOnce(SceneId) + Send>;
pub type OnFailed = Box<dyn FnOnce(SceneError) + Send>;

/// Sealed load request tree.
pub struct LoadPlan {
    pub name: String,
    pub mode: LoadMode,
    pub parallel: bool,
    pub tags: Vec<String>,
    pub payload: Option<SceneData>,
    pub propagate_data: bool,
    pub requested_at: SystemTime,
    pub children: Vec<LoadPlan>,
    pub on_complete: Option<OnLoaded>,
    pub on_fail: Option<OnFailed>,
}

impl LoadPlan {
    pub fn new(name: impl Into<String>, mode: LoadMode) -> Self {
        Self {
            name: name.into(),
            mode,
            parallel: false,
            tags: Vec::new(),
            payload: None,
            propagate_data: false,
            requested_at: SystemTime::now(),
            children: Vec::new(),
            on_complete: None,
            on_fail: None,
        }
    }
}

impl fmt::Debug for LoadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadPlan")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("parallel", &self.parallel)
            .field("tags", &self.tags)
            .field("payload", &self.payload)
            .field("propagate_data", &self.propagate_data)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// What an unload node removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnloadTarget {
    Id(SceneId),
    /// Resolved against the active scenes when the node runs.
    Name(String),
}

impl fmt::Display for UnloadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnloadTarget::Id(id) => write!(f, "{}", id),
            UnloadTarget::Name(name) => f.write_str(name),
        }
    }
}

/// Sealed unload request tree.
pub struct UnloadPlan {
    pub target: UnloadTarget,
    pub parallel: bool,
    pub children: Vec<UnloadPlan>,
    pub on_complete: Option<OnUnloaded>,
    pub on_fail: Option<OnFailed>,
}

impl UnloadPlan {
    pub fn new(target: UnloadTarget) -> Self {
        Self {
            target,
            parallel: false,
            children: Vec::new(),
            on_complete: None,
            on_fail: None,
        }
    }
}

impl fmt::Debug for UnloadPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnloadPlan")
            .field("target", &self.target)
            .field("parallel", &self.parallel)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Names and identities whose self-actions are waiting for the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub loads: Vec<String>,
    pub unloads: Vec<SceneId>,
}

#[derive(Debug)]
pub enum Command {
    ApplyLoad(LoadPlan),
    ApplyUnload(UnloadPlan),
    UnloadByTag {
        tag: String,
        respond_to: Response<Vec<SceneId>>,
    },
    Loaded {
        id: SceneId,
        name: String,
        mode: LoadMode,
    },
    Unloaded {
        id: SceneId,
    },
    Scenes {
        respond_to: Response<Vec<ResourceHandle>>,
    },
    Find {
        id: SceneId,
        respond_to: Response<Option<ResourceHandle>>,
    },
    FindByTag {
        tag: String,
        respond_to: Response<Vec<ResourceHandle>>,
    },
    Pending {
        respond_to: Response<PendingSnapshot>,
    },
}
