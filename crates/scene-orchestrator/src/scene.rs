//! Scene identity, load modes, typed payloads and the handle describing one
//! active scene.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Engine-assigned identity of a loaded scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene_{}", self.0)
    }
}

impl From<u64> for SceneId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// How a scene is loaded relative to the scenes already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadMode {
    /// Only one scene may be active under this mode; the loader replaces the others.
    Exclusive,
    /// Coexists with the scenes already active.
    Additive,
}

/// Type-erased payload attached to a load request.
///
/// Cloning shares the same value. Access is typed and fallible: asking for
/// the wrong type yields `None` (or [`SceneError::PayloadType`] through
/// [`ResourceHandle::data`]).
#[derive(Clone)]
pub struct SceneData {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl SceneData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Borrows the payload as `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns a shared pointer to the payload as `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same payload value.
    pub fn ptr_eq(a: &SceneData, b: &SceneData) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }
}

impl fmt::Debug for SceneData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneData")
            .field("type", &self.type_name)
            .finish()
    }
}

/// Provenance of a scene that was produced by a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOrigin {
    pub requested_name: String,
    pub mode: LoadMode,
    pub requested_at: SystemTime,
}

/// One active scene.
///
/// Handles are owned by the runtime's active registry; callers always work
/// with clones.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    pub id: SceneId,
    pub name: String,
    pub started_at: SystemTime,
    pub tags: Vec<String>,
    pub payload: Option<SceneData>,
    /// `None` when the scene was adopted from an unmatched loader event.
    pub origin: Option<LoadOrigin>,
}

impl ResourceHandle {
    /// Builds the handle for a scene that appeared without a matching request.
    pub fn adopted(id: SceneId, name: impl Into<String>, tag: &str) -> Self {
        Self {
            id,
            name: name.into(),
            started_at: SystemTime::now(),
            tags: vec![tag.to_string()],
            payload: None,
            origin: None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_adopted(&self) -> bool {
        self.origin.is_none()
    }

    /// Typed payload access.
    ///
    /// Returns `Ok(None)` when the scene carries no payload and
    /// [`SceneError::PayloadType`] when it carries a payload of another type.
    pub fn data<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>, SceneError> {
        match &self.payload {
            None => Ok(None),
            Some(data) => data.downcast::<T>().map(Some).ok_or(SceneError::PayloadType {
                id: self.id,
                expected: type_name::<T>(),
            }),
        }
    }
}
