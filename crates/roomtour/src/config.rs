//! Tour files and tunable viewer settings.
//!
//! A tour file is JSON:
//!
//! ```json
//! {
//!   "start_room": "room1",
//!   "settings": { "raycast_interval_ms": 50 },
//!   "rooms": [
//!     { "id": "room1", "name": "Living room", "imageUri": "gallery/a.jpg",
//!       "hotspots": [{ "x": 40, "y": 0, "z": -30, "targetRoomId": "room2", "label": "Bedroom" }] }
//!   ]
//! }
//! ```
//!
//! Every setting has a default, so `settings` and any of its fields may be
//! omitted.

use std::time::Duration;

use serde::Deserialize;

use crate::catalog::{Catalog, Room, RoomId};
use crate::error::{CatalogError, Result};

/// Tunables for camera, input, rendering and overlay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Degrees of orbit per pixel of drag.
    pub sensitivity: f32,
    /// Latitude limit in degrees.
    pub max_latitude: f32,
    /// Minimum time between two hover ray tests.
    pub raycast_interval_ms: u64,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radius of the panorama sphere; also the look-target radius.
    pub sphere_radius: f32,
    /// Segments around and from pole to pole.
    pub sphere_segments: u32,
    pub marker_radius: f32,
    pub marker_segments: u32,
    pub ring_inner: f32,
    pub ring_outer: f32,
    /// Peak relative marker scale change of the idle pulse.
    pub pulse_amplitude: f32,
    /// Pulse angular speed in radians per second.
    pub pulse_frequency: f32,
    /// Panoramas wider or taller than this are downscaled before upload.
    pub max_texture_size: u32,
    pub toast_duration_ms: u64,
    /// Tooltip offset from the pointer, in logical pixels.
    pub tooltip_offset: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            max_latitude: crate::orientation::DEFAULT_MAX_LATITUDE,
            raycast_interval_ms: 50,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            sphere_radius: 500.0,
            sphere_segments: 60,
            marker_radius: 3.0,
            marker_segments: 12,
            ring_inner: 4.0,
            ring_outer: 5.0,
            pulse_amplitude: 0.1,
            pulse_frequency: 3.0,
            max_texture_size: 4096,
            toast_duration_ms: 3000,
            tooltip_offset: 15.0,
        }
    }
}

impl ViewerSettings {
    #[must_use]
    pub fn raycast_interval(&self) -> Duration {
        Duration::from_millis(self.raycast_interval_ms)
    }

    #[must_use]
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Marker scale for the idle pulse at `elapsed` seconds.
    #[must_use]
    pub fn pulse_scale(&self, elapsed: f32) -> f32 {
        1.0 + (elapsed * self.pulse_frequency).sin() * self.pulse_amplitude
    }
}

/// A tour as read from disk or the network.
#[derive(Debug, Clone, Deserialize)]
pub struct TourFile {
    /// Room shown first; defaults to the first room.
    #[serde(default)]
    pub start_room: Option<RoomId>,
    #[serde(default)]
    pub settings: ViewerSettings,
    pub rooms: Vec<Room>,
}

/// A validated tour: catalog, starting room and settings.
#[derive(Debug, Clone)]
pub struct Tour {
    pub catalog: Catalog,
    pub start_room: RoomId,
    pub settings: ViewerSettings,
}

impl Tour {
    /// Validate a parsed tour file.
    pub fn from_file(file: TourFile) -> Result<Self> {
        let catalog = Catalog::new(file.rooms)?;
        let start_room = match file.start_room {
            Some(id) => catalog.get(&id)?.id.clone(),
            None => catalog.first().id.clone(),
        };
        Ok(Self {
            catalog,
            start_room,
            settings: file.settings,
        })
    }

    /// Parse and validate a JSON tour.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TourFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Read a JSON tour from the filesystem.
    #[cfg(not(target_family = "wasm"))]
    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::Parse {
            context: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: TourFile = serde_json::from_str(&json).map_err(|e| CatalogError::Parse {
            context: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_file(file)
    }

    /// The built-in demo tour with default settings.
    #[must_use]
    pub fn builtin() -> Self {
        let catalog = Catalog::builtin();
        let start_room = catalog.first().id.clone();
        Self {
            catalog,
            start_room,
            settings: ViewerSettings::default(),
        }
    }

    /// Override the starting room.
    pub fn with_start_room(mut self, id: RoomId) -> Result<Self> {
        self.start_room = self.catalog.get(&id)?.id.clone();
        Ok(self)
    }
}
