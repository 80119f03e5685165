//! The scene graph: a fixed catalog of panoramic rooms and their hotspots.
//!
//! The catalog is validated once on construction. After that every hotspot
//! target is guaranteed to resolve, so navigation never has to deal with
//! dangling links at runtime.

use std::collections::HashMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Stable identifier of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of a hotspot: its owning room plus its index in that room.
///
/// Two loads of the same room produce hotspots with equal ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HotspotId {
    pub room: RoomId,
    pub index: usize,
}

impl HotspotId {
    pub fn new(room: RoomId, index: usize) -> Self {
        Self { room, index }
    }
}

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.room, self.index)
    }
}

/// A navigable point inside a room's sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HotspotDef", into = "HotspotDef")]
pub struct Hotspot {
    /// Marker anchor in camera space.
    pub position: Vec3,
    /// Room activated when the hotspot is clicked.
    pub target: RoomId,
    /// Text shown on hover.
    pub label: String,
}

impl Hotspot {
    pub fn new(position: Vec3, target: impl Into<RoomId>, label: impl Into<String>) -> Self {
        Self {
            position,
            target: target.into(),
            label: label.into(),
        }
    }
}

/// Wire form of a hotspot in tour files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotspotDef {
    x: f32,
    y: f32,
    z: f32,
    target_room_id: RoomId,
    label: String,
}

impl From<HotspotDef> for Hotspot {
    fn from(def: HotspotDef) -> Self {
        Self {
            position: Vec3::new(def.x, def.y, def.z),
            target: def.target_room_id,
            label: def.label,
        }
    }
}

impl From<Hotspot> for HotspotDef {
    fn from(hotspot: Hotspot) -> Self {
        Self {
            x: hotspot.position.x,
            y: hotspot.position.y,
            z: hotspot.position.z,
            target_room_id: hotspot.target,
            label: hotspot.label,
        }
    }
}

/// One spherical panoramic scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    /// Display label.
    pub name: String,
    /// Source of the equirectangular texture.
    pub image_uri: String,
    /// Hotspots in interaction priority order.
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

impl Room {
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>, image_uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_uri: image_uri.into(),
            hotspots: Vec::new(),
        }
    }

    /// Builder-style hotspot append.
    #[must_use]
    pub fn with_hotspot(mut self, hotspot: Hotspot) -> Self {
        self.hotspots.push(hotspot);
        self
    }

    /// Ids of this room's hotspots, in order.
    pub fn hotspot_ids(&self) -> impl Iterator<Item = HotspotId> + '_ {
        (0..self.hotspots.len()).map(|index| HotspotId::new(self.id.clone(), index))
    }
}

/// Validated, immutable registry of rooms.
#[derive(Debug, Clone)]
pub struct Catalog {
    rooms: Vec<Room>,
    index: HashMap<RoomId, usize>,
}

impl Catalog {
    /// Build and validate a catalog.
    ///
    /// Fails if the list is empty, an id repeats, or any hotspot targets a
    /// room that is not in the list.
    pub fn new(rooms: Vec<Room>) -> Result<Self> {
        if rooms.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(rooms.len());
        for (i, room) in rooms.iter().enumerate() {
            if index.insert(room.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateRoom {
                    id: room.id.clone(),
                });
            }
        }

        for room in &rooms {
            for (hotspot, h) in room.hotspots.iter().enumerate() {
                if !index.contains_key(&h.target) {
                    return Err(CatalogError::UnknownTarget {
                        room: room.id.clone(),
                        hotspot,
                        target: h.target.clone(),
                    });
                }
            }
        }

        Ok(Self { rooms, index })
    }

    /// The default three-room tour.
    #[must_use]
    pub fn builtin() -> Self {
        let rooms = vec![
            Room::new("room1", "Living room", "gallery/treetop_balcony.jpg")
                .with_hotspot(Hotspot::new(
                    Vec3::new(40.0, 0.0, -30.0),
                    "room2",
                    "Go to the bedroom",
                ))
                .with_hotspot(Hotspot::new(
                    Vec3::new(-40.0, 0.0, 30.0),
                    "room3",
                    "Step outside",
                )),
            Room::new("room2", "Bedroom", "gallery/room2.jpg").with_hotspot(Hotspot::new(
                Vec3::new(-50.0, 0.0, 0.0),
                "room1",
                "Back to the living room",
            )),
            Room::new("room3", "Outdoors", "gallery/room1.jpg").with_hotspot(Hotspot::new(
                Vec3::new(50.0, 0.0, 0.0),
                "room1",
                "Back to the living room",
            )),
        ];

        // The literal above is known to be consistent.
        match Self::new(rooms) {
            Ok(catalog) => catalog,
            Err(e) => unreachable!("builtin tour is invalid: {e}"),
        }
    }

    /// Look up a room by id.
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.index.get(id).map(|&i| &self.rooms[i])
    }

    /// Look up a room by id, failing with [`CatalogError::UnknownRoom`].
    pub fn get(&self, id: &RoomId) -> Result<&Room> {
        self.room(id)
            .ok_or_else(|| CatalogError::UnknownRoom { id: id.clone() })
    }

    /// Look up a single hotspot.
    #[must_use]
    pub fn hotspot(&self, id: &HotspotId) -> Option<&Hotspot> {
        self.room(&id.room)?.hotspots.get(id.index)
    }

    /// All rooms in definition order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// The first room of the tour.
    #[must_use]
    pub fn first(&self) -> &Room {
        // Non-emptiness is checked in `new`.
        &self.rooms[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_resolves() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.rooms().len(), 3);
        assert_eq!(catalog.first().id, RoomId::from("room1"));
        let bedroom = catalog.get(&RoomId::from("room2")).unwrap();
        assert_eq!(bedroom.hotspots.len(), 1);
        assert_eq!(bedroom.hotspots[0].target, RoomId::from("room1"));
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let rooms = vec![
            Room::new("a", "A", "a.jpg").with_hotspot(Hotspot::new(Vec3::X, "b", "to b")),
            Room::new("c", "C", "c.jpg"),
        ];
        let err = Catalog::new(rooms).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownTarget {
                room: RoomId::from("a"),
                hotspot: 0,
                target: RoomId::from("b"),
            }
        );
    }

    #[test]
    fn test_duplicate_and_empty_are_rejected() {
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);

        let rooms = vec![Room::new("a", "A", "a.jpg"), Room::new("a", "A2", "b.jpg")];
        assert!(matches!(
            Catalog::new(rooms),
            Err(CatalogError::DuplicateRoom { .. })
        ));
    }

    #[test]
    fn test_lookup_missing_room() {
        let catalog = Catalog::builtin();
        let missing = RoomId::from("attic");
        assert!(catalog.room(&missing).is_none());
        assert_eq!(
            catalog.get(&missing).unwrap_err(),
            CatalogError::UnknownRoom { id: missing }
        );
    }

    #[test]
    fn test_room_json_wire_format() {
        let json = r#"{
            "id": "hall",
            "name": "Hall",
            "imageUri": "https://example.com/hall.jpg",
            "hotspots": [
                { "x": 10, "y": -2.5, "z": 4, "targetRoomId": "hall", "label": "Loop" }
            ]
        }"#;
        let room: Room = serde_json::from_str(json).unwrap();
        assert_eq!(room.id, RoomId::from("hall"));
        assert_eq!(room.image_uri, "https://example.com/hall.jpg");
        assert_eq!(room.hotspots[0].position, Vec3::new(10.0, -2.5, 4.0));
        assert_eq!(room.hotspots[0].target, RoomId::from("hall"));
    }

    #[test]
    fn test_hotspot_ids_follow_insertion_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<_> = catalog.first().hotspot_ids().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].to_string(), "room1#1");
        assert_eq!(catalog.hotspot(&ids[1]).unwrap().label, "Step outside");
    }
}
