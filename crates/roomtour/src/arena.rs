//! Arena of disposable render resources.
//!
//! Every GPU-side object the renderer creates is registered here under a
//! [`ResourceKey`]. Ownership is explicit: a room's texture and hotspot
//! markers belong to that room and are released together with
//! [`ResourceArena::release_all`], never by walking a scene tree.

use crate::catalog::{HotspotId, RoomId};

/// Who a resource belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Lives as long as the viewer (the panorama sphere).
    Viewer,
    /// Lives while the room is loaded.
    Room(RoomId),
}

/// Key of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// The panorama sphere mesh and material.
    Sphere,
    /// A room's decoded panorama texture.
    Texture(RoomId),
    /// A hotspot marker (mesh, material and its ring).
    Marker(HotspotId),
}

impl ResourceKey {
    #[must_use]
    pub fn owner(&self) -> Owner {
        match self {
            ResourceKey::Sphere => Owner::Viewer,
            ResourceKey::Texture(room) => Owner::Room(room.clone()),
            ResourceKey::Marker(id) => Owner::Room(id.room.clone()),
        }
    }
}

/// Insertion-ordered map from keys to backend handles.
#[derive(Debug)]
pub struct ResourceArena<H> {
    entries: Vec<(ResourceKey, H)>,
}

impl<H> Default for ResourceArena<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> ResourceArena<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle. A handle previously stored under the same key is
    /// returned so the caller can release it.
    pub fn insert(&mut self, key: ResourceKey, handle: H) -> Option<H> {
        let previous = self.remove(&key);
        self.entries.push((key, handle));
        previous
    }

    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&H> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, h)| h)
    }

    pub fn remove(&mut self, key: &ResourceKey) -> Option<H> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Remove every resource owned by `room`, in insertion order.
    pub fn release_all(&mut self, room: &RoomId) -> Vec<H> {
        let owner = Owner::Room(room.clone());
        self.take_where(|key| key.owner() == owner)
    }

    /// Remove everything.
    pub fn drain(&mut self) -> Vec<H> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(_, h)| h)
            .collect()
    }

    fn take_where(&mut self, mut pred: impl FnMut(&ResourceKey) -> bool) -> Vec<H> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(key, _)| pred(key));
        self.entries = kept;
        taken.into_iter().map(|(_, h)| h).collect()
    }

    /// Marker handles, in hotspot order.
    pub fn markers(&self) -> impl Iterator<Item = (&HotspotId, &H)> {
        self.entries.iter().filter_map(|(key, h)| match key {
            ResourceKey::Marker(id) => Some((id, h)),
            _ => None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(room: &str, index: usize) -> ResourceKey {
        ResourceKey::Marker(HotspotId::new(RoomId::from(room), index))
    }

    #[test]
    fn test_release_all_only_touches_owner() {
        let mut arena = ResourceArena::new();
        arena.insert(ResourceKey::Sphere, 1);
        arena.insert(ResourceKey::Texture(RoomId::from("a")), 2);
        arena.insert(marker("a", 0), 3);
        arena.insert(marker("a", 1), 4);
        arena.insert(ResourceKey::Texture(RoomId::from("b")), 5);

        let released = arena.release_all(&RoomId::from("a"));
        assert_eq!(released, vec![2, 3, 4]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(&ResourceKey::Sphere), Some(&1));

        // Releasing again finds nothing.
        assert!(arena.release_all(&RoomId::from("a")).is_empty());
    }

    #[test]
    fn test_insert_returns_replaced_handle() {
        let mut arena = ResourceArena::new();
        assert_eq!(arena.insert(ResourceKey::Sphere, 1), None);
        assert_eq!(arena.insert(ResourceKey::Sphere, 2), Some(1));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_markers_in_order() {
        let mut arena = ResourceArena::new();
        arena.insert(marker("a", 0), 10);
        arena.insert(ResourceKey::Texture(RoomId::from("a")), 11);
        arena.insert(marker("a", 1), 12);
        let handles: Vec<_> = arena.markers().map(|(_, h)| *h).collect();
        assert_eq!(handles, vec![10, 12]);
    }

    #[test]
    fn test_drain_empties() {
        let mut arena = ResourceArena::new();
        arena.insert(ResourceKey::Sphere, 'x');
        assert_eq!(arena.drain(), vec!['x']);
        assert!(arena.is_empty());
        assert!(arena.drain().is_empty());
    }
}
