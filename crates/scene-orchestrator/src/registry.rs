//! Active scene registry.
//!
//! Insertion-ordered and unique by [`SceneId`]. Only the runtime task mutates
//! it, so no locking is involved.

use crate::scene::{ResourceHandle, SceneId};

#[derive(Debug, Default)]
pub struct ActiveRegistry {
    scenes: Vec<ResourceHandle>,
}

impl ActiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Inserts a handle at the end of the registry.
    ///
    /// If the identity is already present the entry is replaced in place and
    /// the previous handle is returned.
    pub fn insert(&mut self, handle: ResourceHandle) -> Option<ResourceHandle> {
        match self.scenes.iter_mut().find(|h| h.id == handle.id) {
            Some(existing) => Some(std::mem::replace(existing, handle)),
            None => {
                self.scenes.push(handle);
                None
            }
        }
    }

    pub fn contains(&self, id: SceneId) -> bool {
        self.scenes.iter().any(|h| h.id == id)
    }

    pub fn get(&self, id: SceneId) -> Option<&ResourceHandle> {
        self.scenes.iter().find(|h| h.id == id)
    }

    /// First active scene with this name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<&ResourceHandle> {
        self.scenes.iter().find(|h| h.name == name)
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<ResourceHandle> {
        self.scenes.iter().filter(|h| h.has_tag(tag)).cloned().collect()
    }

    pub fn remove(&mut self, id: SceneId) -> Option<ResourceHandle> {
        let index = self.scenes.iter().position(|h| h.id == id)?;
        Some(self.scenes.remove(index))
    }

    pub fn snapshot(&self) -> Vec<ResourceHandle> {
        self.scenes.clone()
    }
}
