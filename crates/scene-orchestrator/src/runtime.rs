//! # Scene Runtime
//!
//! The `SceneRuntime` is the single coordination point of the orchestrator.
//! It owns:
//!
//! - the [`ActiveRegistry`] of loaded scenes,
//! - the pending-load registry (requested name → node),
//! - the pending-unload registry (scene id → node and the removed handle),
//! - the arena of request nodes with their [`NodePhase`].
//!
//! Every command, loader event and query arrives on one `mpsc` channel and is
//! handled to completion before the next one. Inside a command, node work is
//! queued as [`Step`]s and drained by [`SceneRuntime::drive`]; a node never
//! calls into its parent or children directly.
//!
//! ## Scheduling
//!
//! When a node starts, its self-action is forwarded first. Then:
//!
//! - no children: the subtree half is done immediately;
//! - `Additive` load with `parallel()`: all children start right away;
//! - otherwise: children start once the self-action reports back, all at
//!   once under `parallel()`, else one after the other.
//!
//! A child that fails never completes, so its parent never completes either.
//! Siblings that are already running carry on; a later sequential sibling
//! is never started.

use crate::client::SceneClient;
use crate::completion::{NodePhase, Transition};
use crate::config::RuntimeConfig;
use crate::error::SceneError;
use crate::loader::{SceneCatalog, SceneLoader};
use crate::message::{
    Command, LoadPlan, OnFailed, OnLoaded, OnUnloaded, PendingSnapshot, UnloadPlan, UnloadTarget,
};
use crate::registry::ActiveRegistry;
use crate::scene::{LoadMode, LoadOrigin, ResourceHandle, SceneData, SceneId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Collaborators injected when the runtime starts.
#[derive(Clone)]
pub struct RuntimeContext {
    pub catalog: Arc<dyn SceneCatalog>,
    pub loader: Arc<dyn SceneLoader>,
}

impl RuntimeContext {
    pub fn new(catalog: impl SceneCatalog, loader: impl SceneLoader) -> Self {
        Self {
            catalog: Arc::new(catalog),
            loader: Arc::new(loader),
        }
    }
}

type NodeId = u64;

enum NodeKind {
    Load {
        name: String,
        mode: LoadMode,
        tags: Vec<String>,
        payload: Option<SceneData>,
        propagate_data: bool,
        requested_at: SystemTime,
        on_complete: Option<OnLoaded>,
    },
    Unload {
        target: UnloadTarget,
        on_complete: Option<OnUnloaded>,
    },
}

enum SelfOutcome {
    Loaded(ResourceHandle),
    Unloaded(SceneId),
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    parallel: bool,
    phase: NodePhase,
    children_started: bool,
    completed_children: usize,
    outcome: Option<SelfOutcome>,
    on_fail: Option<OnFailed>,
}

impl Node {
    fn label(&self) -> String {
        match &self.kind {
            NodeKind::Load { name, .. } => name.clone(),
            NodeKind::Unload { target, .. } => target.to_string(),
        }
    }

    /// Children run alongside the self-action instead of after it.
    fn runs_children_with_self(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Load {
                mode: LoadMode::Additive,
                ..
            }
        ) && self.parallel
    }
}

enum Step {
    Start(NodeId),
    SelfDone(NodeId, SelfOutcome),
    ChildCompleted(NodeId),
}

struct PendingUnload {
    node: NodeId,
    handle: ResourceHandle,
}

pub struct SceneRuntime {
    receiver: mpsc::Receiver<Command>,
    active: ActiveRegistry,
    pending_loads: HashMap<String, NodeId>,
    pending_unloads: HashMap<SceneId, PendingUnload>,
    nodes: HashMap<NodeId, Node>,
    next_node: NodeId,
    steps: VecDeque<Step>,
}

impl SceneRuntime {
    /// Creates a new `SceneRuntime` and its associated `SceneClient`.
    ///
    /// `buffer_size` is the capacity of the command channel shared by clients
    /// and loader events.
    pub fn new(buffer_size: usize) -> (Self, SceneClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let runtime = Self {
            receiver,
            active: ActiveRegistry::new(),
            pending_loads: HashMap::new(),
            pending_unloads: HashMap::new(),
            nodes: HashMap::new(),
            next_node: 1,
            steps: VecDeque::new(),
        };
        (runtime, SceneClient::new(sender))
    }

    pub fn with_config(config: &RuntimeConfig) -> (Self, SceneClient) {
        Self::new(config.buffer_size)
    }

    /// Runs the event loop until every client is dropped.
    ///
    /// Collaborators are injected here rather than in `new()`, so a loader can
    /// be built from the client's [`LoaderEvents`](crate::client::LoaderEvents)
    /// before the loop starts.
    pub async fn run(mut self, context: RuntimeContext) {
        info!("Scene runtime started");

        while let Some(command) = self.receiver.recv().await {
            self.handle(command, &context).await;
        }

        info!(
            active = self.active.len(),
            abandoned = self.nodes.len(),
            "Shutdown"
        );
    }

    async fn handle(&mut self, command: Command, context: &RuntimeContext) {
        match command {
            Command::ApplyLoad(plan) => {
                debug!(?plan, "ApplyLoad");
                let root = self.insert_load(plan, None);
                self.steps.push_back(Step::Start(root));
            }
            Command::ApplyUnload(plan) => {
                debug!(?plan, "ApplyUnload");
                let root = self.insert_unload(plan, None);
                self.steps.push_back(Step::Start(root));
            }
            Command::UnloadByTag { tag, respond_to } => {
                let ids: Vec<SceneId> = self
                    .active
                    .find_by_tag(&tag)
                    .into_iter()
                    .map(|h| h.id)
                    .collect();
                info!(%tag, count = ids.len(), "Unload by tag");
                for id in &ids {
                    let root = self.insert_unload(UnloadPlan::new(UnloadTarget::Id(*id)), None);
                    self.steps.push_back(Step::Start(root));
                }
                let _ = respond_to.send(Ok(ids));
            }
            Command::Loaded { id, name, mode } => self.on_loaded(id, name, mode),
            Command::Unloaded { id } => self.on_unloaded(id),
            Command::Scenes { respond_to } => {
                let _ = respond_to.send(Ok(self.active.snapshot()));
            }
            Command::Find { id, respond_to } => {
                let found = self.active.get(id).cloned();
                debug!(%id, found = found.is_some(), "Find");
                let _ = respond_to.send(Ok(found));
            }
            Command::FindByTag { tag, respond_to } => {
                let _ = respond_to.send(Ok(self.active.find_by_tag(&tag)));
            }
            Command::Pending { respond_to } => {
                let mut loads: Vec<String> = self.pending_loads.keys().cloned().collect();
                loads.sort();
                let mut unloads: Vec<SceneId> = self.pending_unloads.keys().copied().collect();
                unloads.sort();
                let _ = respond_to.send(Ok(PendingSnapshot { loads, unloads }));
            }
        }

        self.drive(context).await;
    }

    /// Drains queued node work in FIFO order.
    async fn drive(&mut self, context: &RuntimeContext) {
        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Start(node) => self.start(node, context).await,
                Step::SelfDone(node, outcome) => self.self_done(node, outcome),
                Step::ChildCompleted(parent) => self.child_completed(parent),
            }
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    fn insert_load(&mut self, plan: LoadPlan, parent: Option<NodeId>) -> NodeId {
        let id = self.allocate();
        let LoadPlan {
            name,
            mode,
            parallel,
            tags,
            payload,
            propagate_data,
            requested_at,
            children,
            on_complete,
            on_fail,
        } = plan;
        let children = children
            .into_iter()
            .map(|child| self.insert_load(child, Some(id)))
            .collect();
        self.nodes.insert(
            id,
            Node {
                kind: NodeKind::Load {
                    name,
                    mode,
                    tags,
                    payload,
                    propagate_data,
                    requested_at,
                    on_complete,
                },
                parent,
                children,
                parallel,
                phase: NodePhase::Pending,
                children_started: false,
                completed_children: 0,
                outcome: None,
                on_fail,
            },
        );
        id
    }

    fn insert_unload(&mut self, plan: UnloadPlan, parent: Option<NodeId>) -> NodeId {
        let id = self.allocate();
        let UnloadPlan {
            target,
            parallel,
            children,
            on_complete,
            on_fail,
        } = plan;
        let children = children
            .into_iter()
            .map(|child| self.insert_unload(child, Some(id)))
            .collect();
        self.nodes.insert(
            id,
            Node {
                kind: NodeKind::Unload {
                    target,
                    on_complete,
                },
                parent,
                children,
                parallel,
                phase: NodePhase::Pending,
                children_started: false,
                completed_children: 0,
                outcome: None,
                on_fail,
            },
        );
        id
    }

    async fn start(&mut self, id: NodeId, context: &RuntimeContext) {
        let is_load = match self.nodes.get(&id) {
            Some(node) => matches!(node.kind, NodeKind::Load { .. }),
            None => return,
        };

        let submitted = if is_load {
            self.submit_load(id, context).await
        } else {
            self.submit_unload(id, context).await
        };
        if let Err(e) = submitted {
            self.fail(id, e);
            return;
        }

        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.children.is_empty() {
            self.children_done(id);
        } else if node.runs_children_with_self() {
            self.start_children(id);
        }
    }

    async fn submit_load(
        &mut self,
        id: NodeId,
        context: &RuntimeContext,
    ) -> Result<(), SceneError> {
        let Some(Node {
            kind: NodeKind::Load { name, mode, .. },
            ..
        }) = self.nodes.get(&id)
        else {
            return Ok(());
        };
        let (name, mode) = (name.clone(), *mode);

        if !context.catalog.exists(&name) {
            warn!(scene = %name, "Load target does not exist");
            return Err(SceneError::InvalidTarget(name));
        }
        if self.pending_loads.contains_key(&name) {
            warn!(scene = %name, "Load already pending");
            return Err(SceneError::AlreadyPending(name));
        }

        self.pending_loads.insert(name.clone(), id);
        if let Err(source) = context.loader.load(&name, mode).await {
            self.pending_loads.remove(&name);
            warn!(scene = %name, error = %source, "Loader rejected load");
            return Err(SceneError::LoaderRejected {
                target: name,
                source,
            });
        }

        info!(scene = %name, ?mode, "Load request accepted");
        Ok(())
    }

    async fn submit_unload(
        &mut self,
        id: NodeId,
        context: &RuntimeContext,
    ) -> Result<(), SceneError> {
        let Some(Node {
            kind: NodeKind::Unload { target, .. },
            ..
        }) = self.nodes.get(&id)
        else {
            return Ok(());
        };

        let resolved = match target {
            UnloadTarget::Id(scene) => self.active.get(*scene),
            UnloadTarget::Name(name) => self.active.find_by_name(name),
        }
        .map(|h| h.id);
        let Some(scene) = resolved else {
            warn!(%target, "Unload target is not active");
            return Err(SceneError::InvalidTarget(target.to_string()));
        };

        // Optimistic removal: the scene is gone for lookups from here on.
        let Some(handle) = self.active.remove(scene) else {
            return Err(SceneError::InvalidTarget(scene.to_string()));
        };
        self.pending_unloads.insert(scene, PendingUnload { node: id, handle });
        if let Some(Node {
            kind: NodeKind::Unload { target, .. },
            ..
        }) = self.nodes.get_mut(&id)
        {
            *target = UnloadTarget::Id(scene);
        }

        if let Err(source) = context.loader.unload(scene).await {
            if let Some(record) = self.pending_unloads.remove(&scene) {
                self.active.insert(record.handle);
            }
            warn!(id = %scene, error = %source, "Loader rejected unload");
            return Err(SceneError::LoaderRejected {
                target: scene.to_string(),
                source,
            });
        }

        info!(id = %scene, size = self.active.len(), "Unload request accepted");
        Ok(())
    }

    fn on_loaded(&mut self, id: SceneId, name: String, mode: LoadMode) {
        if self.active.contains(id) {
            warn!(%id, scene = %name, "Scene already processed");
        }

        let request = self.pending_loads.remove(&name).and_then(|node_id| {
            match self.nodes.get(&node_id) {
                Some(Node {
                    kind:
                        NodeKind::Load {
                            tags,
                            payload,
                            mode,
                            requested_at,
                            ..
                        },
                    ..
                }) => Some((
                    node_id,
                    tags.clone(),
                    payload.clone(),
                    LoadOrigin {
                        requested_name: name.clone(),
                        mode: *mode,
                        requested_at: *requested_at,
                    },
                )),
                _ => {
                    error!(%id, scene = %name, "Pending load lost its request node");
                    None
                }
            }
        });

        match request {
            Some((node_id, tags, payload, origin)) => {
                let handle = ResourceHandle {
                    id,
                    name,
                    started_at: SystemTime::now(),
                    tags,
                    payload,
                    origin: Some(origin),
                };
                self.active.insert(handle.clone());
                info!(%id, scene = %handle.name, size = self.active.len(), "Scene loaded");
                self.steps
                    .push_back(Step::SelfDone(node_id, SelfOutcome::Loaded(handle)));
            }
            None if self.pending_unloads.contains_key(&id) => {
                // Stays out of the registry until its unload is reported.
                warn!(
                    %id,
                    scene = %name,
                    "Scene loaded while its unload is pending, ignoring"
                );
            }
            None => {
                let tag = if self.active.is_empty() { "root" } else { "unknown" };
                warn!(%id, scene = %name, ?mode, tag, "Scene loaded without a request, adopting");
                self.active.insert(ResourceHandle::adopted(id, name, tag));
            }
        }
    }

    fn on_unloaded(&mut self, id: SceneId) {
        match self.pending_unloads.remove(&id) {
            Some(record) => {
                info!(%id, scene = %record.handle.name, "Scene unloaded");
                self.steps
                    .push_back(Step::SelfDone(record.node, SelfOutcome::Unloaded(id)));
            }
            None => {
                if let Some(handle) = self.active.remove(id) {
                    debug!(%id, scene = %handle.name, "Scene unloaded externally");
                } else {
                    debug!(%id, "Unmatched unload event");
                }
            }
        }
    }

    fn self_done(&mut self, id: NodeId, outcome: SelfOutcome) {
        let Some(node) = self.nodes.get_mut(&id) else {
            error!(node = id, "Self-action finished for an unknown node");
            return;
        };
        node.outcome = Some(outcome);
        match node.phase.self_done() {
            Transition::Completed => self.complete(id),
            Transition::Advanced => {
                if !node.children_started {
                    self.start_children(id);
                }
            }
            Transition::Failed | Transition::Ignored => {
                error!(node = id, phase = ?node.phase, "Duplicate self completion ignored");
            }
        }
    }

    fn children_done(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        match node.phase.children_done() {
            Transition::Completed => self.complete(id),
            Transition::Advanced => {}
            Transition::Failed | Transition::Ignored => {
                error!(node = id, phase = ?node.phase, "Duplicate children completion ignored");
            }
        }
    }

    fn start_children(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.children_started = true;
        let children = node.children.clone();
        let parallel = node.parallel;
        let inherited = match &node.kind {
            NodeKind::Load {
                payload: Some(data),
                propagate_data: true,
                ..
            } => Some(data.clone()),
            _ => None,
        };

        if let Some(data) = inherited {
            for child in &children {
                if let Some(Node {
                    kind:
                        NodeKind::Load {
                            payload,
                            propagate_data,
                            ..
                        },
                    ..
                }) = self.nodes.get_mut(child)
                {
                    if payload.is_none() {
                        *payload = Some(data.clone());
                        *propagate_data = true;
                    }
                }
            }
        }

        if parallel {
            self.steps.extend(children.into_iter().map(Step::Start));
        } else if let Some(first) = children.first() {
            self.steps.push_back(Step::Start(*first));
        }
    }

    fn child_completed(&mut self, parent: NodeId) {
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        node.completed_children += 1;
        if node.completed_children >= node.children.len() {
            self.children_done(parent);
        } else if !node.parallel {
            let next = node.children[node.completed_children];
            self.steps.push_back(Step::Start(next));
        }
    }

    fn complete(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        let label = node.label();
        match (node.kind, node.outcome) {
            (NodeKind::Load { on_complete, .. }, Some(SelfOutcome::Loaded(handle))) => {
                info!(scene = %label, id = %handle.id, "Load request complete");
                if let Some(callback) = on_complete {
                    callback(handle);
                }
            }
            (NodeKind::Unload { on_complete, .. }, Some(SelfOutcome::Unloaded(scene))) => {
                info!(id = %scene, "Unload request complete");
                if let Some(callback) = on_complete {
                    callback(scene);
                }
            }
            _ => error!(node = id, scene = %label, "Completed without a matching outcome"),
        }
        if let Some(parent) = node.parent {
            self.steps.push_back(Step::ChildCompleted(parent));
        }
    }

    fn fail(&mut self, id: NodeId, error: SceneError) {
        let Some(mut node) = self.nodes.remove(&id) else {
            return;
        };
        if node.phase.fail() != Transition::Failed {
            error!(node = id, phase = ?node.phase, "Failure after terminal phase ignored");
            return;
        }
        warn!(scene = %node.label(), %error, "Request failed");
        // Children of a failed node never start.
        self.discard_subtree(&node.children);
        if let Some(callback) = node.on_fail.take() {
            callback(error);
        }
        if let Some(parent) = node.parent.and_then(|parent| self.nodes.get(&parent)) {
            warn!(
                scene = %parent.label(),
                "Sub-request failed, request will not complete"
            );
        }
    }

    fn discard_subtree(&mut self, children: &[NodeId]) {
        for child in children {
            if let Some(node) = self.nodes.remove(child) {
                self.discard_subtree(&node.children);
            }
        }
    }
}
