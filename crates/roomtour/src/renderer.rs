//! Renderer state: panorama sphere, texture slot, hotspot markers and the
//! per-frame camera update.
//!
//! The renderer does not talk to a GPU directly. It drives a
//! [`RenderBackend`], which owns the actual meshes, materials and textures,
//! and records every handle it gets back in a [`ResourceArena`].
//!
//! # Loading
//!
//! Image fetch and decode happen outside the renderer. [`Renderer::begin_load`]
//! hands out a [`LoadRequest`] carrying a monotonically increasing
//! [`LoadTicket`]; the host performs the fetch and passes the result to
//! [`Renderer::complete_load`] together with the ticket. Only the most recent
//! ticket is honoured, so a slow load can never replace the texture of a
//! newer one.

use glam::Vec2;

use crate::arena::{ResourceArena, ResourceKey};
use crate::camera::{CameraPose, PanoramaCamera};
use crate::catalog::{Hotspot, HotspotId, Room, RoomId};
use crate::config::ViewerSettings;
use crate::error::SceneLoadError;
use crate::geometry::{SphereGeometry, panorama_sphere};
use crate::orientation::Orientation;
use crate::picking::{Marker, PickHit, pick};
use crate::source::DecodedImage;

/// Shape of a hotspot marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub segments: u32,
    pub ring_inner: f32,
    pub ring_outer: f32,
}

impl From<&ViewerSettings> for MarkerStyle {
    fn from(settings: &ViewerSettings) -> Self {
        Self {
            radius: settings.marker_radius,
            segments: settings.marker_segments,
            ring_inner: settings.ring_inner,
            ring_outer: settings.ring_outer,
        }
    }
}

impl MarkerStyle {
    /// Radius a ray must pass within to hit the marker. The ring faces the
    /// camera, so its outer edge bounds the clickable area.
    #[must_use]
    pub fn pick_radius(&self) -> f32 {
        self.radius.max(self.ring_outer)
    }
}

/// GPU-side operations the renderer needs.
///
/// `release` must accept every handle exactly once; the arena guarantees the
/// renderer never hands back the same handle twice.
pub trait RenderBackend {
    /// Opaque handle to a backend resource.
    type Handle;

    /// Create the panorama sphere mesh and its (untextured) material.
    fn create_sphere(&mut self, geometry: &SphereGeometry) -> Self::Handle;

    /// Upload a decoded panorama.
    fn upload_texture(&mut self, room: &RoomId, image: DecodedImage) -> Self::Handle;

    /// Make `texture` the sphere material's colour map.
    fn bind_texture(&mut self, sphere: &Self::Handle, texture: &Self::Handle);

    /// Create a marker for a hotspot at its stored position.
    fn spawn_marker(&mut self, id: &HotspotId, hotspot: &Hotspot, style: &MarkerStyle)
    -> Self::Handle;

    /// Uniformly scale a marker.
    fn set_marker_scale(&mut self, marker: &Self::Handle, scale: f32);

    /// Destroy a resource and free its GPU memory.
    fn release(&mut self, handle: Self::Handle);
}

/// Token identifying one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

/// A load the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub room: RoomId,
    pub uri: String,
}

/// What happened to a completed load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The room is now displayed.
    Applied {
        room: RoomId,
        previous: Option<RoomId>,
    },
    /// A newer request (or teardown) made this result irrelevant.
    Superseded,
    /// The image could not be loaded; the previous room stays displayed.
    Failed(SceneLoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Mounted,
    Disposed,
}

#[derive(Debug)]
struct PendingLoad {
    ticket: LoadTicket,
    room: Room,
}

/// Renderer state for one viewer.
#[derive(Debug)]
pub struct Renderer<H> {
    camera: PanoramaCamera,
    settings: ViewerSettings,
    arena: ResourceArena<H>,
    displayed: Option<RoomId>,
    markers: Vec<Marker>,
    marker_scale: f32,
    next_ticket: u64,
    pending: Option<PendingLoad>,
    lifecycle: Lifecycle,
}

impl<H> Renderer<H> {
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            camera: PanoramaCamera::new(
                settings.fov_degrees,
                settings.near,
                settings.far,
                settings.sphere_radius,
            ),
            settings: settings.clone(),
            arena: ResourceArena::new(),
            displayed: None,
            markers: Vec::new(),
            marker_scale: 1.0,
            next_ticket: 0,
            pending: None,
            lifecycle: Lifecycle::Created,
        }
    }

    /// Create the sphere. Repeated calls, or calls after teardown, do nothing.
    pub fn mount<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        if self.lifecycle != Lifecycle::Created {
            return;
        }
        let geometry = panorama_sphere(
            self.settings.sphere_radius,
            self.settings.sphere_segments,
            self.settings.sphere_segments,
        );
        let sphere = backend.create_sphere(&geometry);
        self.arena.insert(ResourceKey::Sphere, sphere);
        self.lifecycle = Lifecycle::Mounted;
        tracing::debug!(
            "Panorama sphere created: {} triangles",
            geometry.triangle_count()
        );
    }

    /// Start loading `room`, superseding any load in flight.
    ///
    /// Returns `None` once the renderer has been disposed.
    pub fn begin_load(&mut self, room: &Room) -> Option<LoadRequest> {
        if self.lifecycle == Lifecycle::Disposed {
            return None;
        }
        if let Some(superseded) = &self.pending {
            tracing::debug!(
                "Load of '{}' superseded by '{}'",
                superseded.room.id,
                room.id
            );
        }

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.pending = Some(PendingLoad {
            ticket,
            room: room.clone(),
        });
        Some(LoadRequest {
            ticket,
            room: room.id.clone(),
            uri: room.image_uri.clone(),
        })
    }

    /// Apply the result of a load started with [`begin_load`](Self::begin_load).
    pub fn complete_load<B>(
        &mut self,
        ticket: LoadTicket,
        result: Result<DecodedImage, SceneLoadError>,
        backend: &mut B,
    ) -> LoadOutcome
    where
        B: RenderBackend<Handle = H>,
    {
        let is_current = self.pending.as_ref().is_some_and(|p| p.ticket == ticket);
        if !is_current || self.lifecycle == Lifecycle::Disposed {
            return LoadOutcome::Superseded;
        }
        let Some(PendingLoad { room, .. }) = self.pending.take() else {
            return LoadOutcome::Superseded;
        };

        match result {
            Ok(image) => {
                let previous = self.apply_room(&room, image, backend);
                tracing::info!(
                    "Displaying room '{}' with {} hotspots",
                    room.id,
                    room.hotspots.len()
                );
                LoadOutcome::Applied {
                    room: room.id,
                    previous,
                }
            }
            Err(e) => {
                let e = if e.room.is_none() {
                    e.for_room(room.id)
                } else {
                    e
                };
                tracing::warn!("Failed to load panorama: {}", e);
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Swap in a loaded room: bind its texture, then release the previous
    /// room's resources and spawn the new markers.
    fn apply_room<B>(&mut self, room: &Room, image: DecodedImage, backend: &mut B) -> Option<RoomId>
    where
        B: RenderBackend<Handle = H>,
    {
        self.mount(backend);

        let texture = backend.upload_texture(&room.id, image);
        if let Some(sphere) = self.arena.get(&ResourceKey::Sphere) {
            backend.bind_texture(sphere, &texture);
        }

        let previous = self.displayed.take();
        if let Some(prev) = &previous {
            self.release_all(prev, backend);
        }

        if let Some(stale) = self
            .arena
            .insert(ResourceKey::Texture(room.id.clone()), texture)
        {
            backend.release(stale);
        }

        let style = MarkerStyle::from(&self.settings);
        self.markers.clear();
        for (index, hotspot) in room.hotspots.iter().enumerate() {
            let id = HotspotId::new(room.id.clone(), index);
            let handle = backend.spawn_marker(&id, hotspot, &style);
            backend.set_marker_scale(&handle, self.marker_scale);
            if let Some(stale) = self.arena.insert(ResourceKey::Marker(id.clone()), handle) {
                backend.release(stale);
            }
            self.markers.push(Marker {
                id,
                center: hotspot.position,
                radius: style.pick_radius(),
            });
        }

        self.displayed = Some(room.id.clone());
        previous
    }

    /// Release every resource owned by `room`.
    pub fn release_all<B>(&mut self, room: &RoomId, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        let released = self.arena.release_all(room);
        tracing::debug!("Releasing {} resources of room '{}'", released.len(), room);
        for handle in released {
            backend.release(handle);
        }
        if self.displayed.as_ref() == Some(room) {
            self.displayed = None;
            self.markers.clear();
        }
    }

    /// Per-frame update. Computes the camera pose for `orientation` and
    /// applies the idle marker pulse.
    ///
    /// Returns `None` when there is nothing to draw (before mount or after
    /// teardown).
    pub fn frame<B>(
        &mut self,
        elapsed: f32,
        orientation: &Orientation,
        backend: &mut B,
    ) -> Option<CameraPose>
    where
        B: RenderBackend<Handle = H>,
    {
        if self.lifecycle != Lifecycle::Mounted {
            return None;
        }

        if !self.markers.is_empty() {
            let scale = self.settings.pulse_scale(elapsed);
            self.marker_scale = scale;
            for (_, handle) in self.arena.markers() {
                backend.set_marker_scale(handle, scale);
            }
        }

        Some(self.camera.pose(orientation))
    }

    /// Ray-test the current markers at a surface point.
    #[must_use]
    pub fn pick(&self, screen: Vec2, orientation: &Orientation) -> Option<PickHit> {
        if self.lifecycle != Lifecycle::Mounted {
            return None;
        }
        let ray = self.camera.ray_through(screen, orientation);
        let scale = self.marker_scale;
        let scaled: Vec<Marker> = self
            .markers
            .iter()
            .map(|m| Marker {
                radius: m.radius * scale,
                ..m.clone()
            })
            .collect();
        pick(&ray, &scaled)
    }

    /// Match the camera to a new surface size.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        self.camera.set_viewport(width, height)
    }

    /// Release everything and stop accepting loads. Safe to call repeatedly.
    pub fn dispose<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        let released = self.arena.drain();
        tracing::debug!("Disposing renderer: {} resources", released.len());
        for handle in released {
            backend.release(handle);
        }
        self.pending = None;
        self.displayed = None;
        self.markers.clear();
        self.lifecycle = Lifecycle::Disposed;
    }

    #[must_use]
    pub fn camera(&self) -> &PanoramaCamera {
        &self.camera
    }

    /// Room whose texture is currently bound.
    #[must_use]
    pub fn displayed_room(&self) -> Option<&RoomId> {
        self.displayed.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    /// Pick geometry of the displayed room's hotspots.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn arena(&self) -> &ResourceArena<H> {
        &self.arena
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use glam::Vec3;

    use super::*;
    use crate::error::SceneLoadErrorKind;

    /// What a recorded handle stands for.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Resource {
        Sphere,
        Texture(RoomId),
        Marker(HotspotId),
    }

    /// Backend double that tracks live resources.
    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        next: u32,
        pub live: HashMap<u32, Resource>,
        pub bound: Option<u32>,
        pub scales: HashMap<u32, f32>,
        pub released: Vec<u32>,
    }

    impl RecordingBackend {
        fn alloc(&mut self, resource: Resource) -> u32 {
            self.next += 1;
            self.live.insert(self.next, resource);
            self.next
        }

        /// Room of the texture bound to the sphere.
        pub fn bound_room(&self) -> Option<RoomId> {
            match self.live.get(&self.bound?) {
                Some(Resource::Texture(room)) => Some(room.clone()),
                _ => None,
            }
        }

        pub fn live_markers(&self) -> Vec<HotspotId> {
            let mut ids: Vec<_> = self
                .live
                .values()
                .filter_map(|r| match r {
                    Resource::Marker(id) => Some(id.clone()),
                    _ => None,
                })
                .collect();
            ids.sort_by_key(|id| id.index);
            ids
        }
    }

    impl RenderBackend for RecordingBackend {
        type Handle = u32;

        fn create_sphere(&mut self, _geometry: &SphereGeometry) -> u32 {
            self.alloc(Resource::Sphere)
        }

        fn upload_texture(&mut self, room: &RoomId, _image: DecodedImage) -> u32 {
            self.alloc(Resource::Texture(room.clone()))
        }

        fn bind_texture(&mut self, _sphere: &u32, texture: &u32) {
            self.bound = Some(*texture);
        }

        fn spawn_marker(&mut self, id: &HotspotId, _hotspot: &Hotspot, _style: &MarkerStyle) -> u32 {
            self.alloc(Resource::Marker(id.clone()))
        }

        fn set_marker_scale(&mut self, marker: &u32, scale: f32) {
            self.scales.insert(*marker, scale);
        }

        fn release(&mut self, handle: u32) {
            assert!(
                self.live.remove(&handle).is_some(),
                "handle {handle} released twice"
            );
            self.released.push(handle);
        }
    }

    pub fn image() -> DecodedImage {
        DecodedImage::new(vec![255; 8], 2, 1)
    }

    fn room_a() -> Room {
        Room::new("a", "A", "a.jpg")
            .with_hotspot(Hotspot::new(Vec3::new(40.0, 0.0, 0.0), "b", "to b"))
            .with_hotspot(Hotspot::new(Vec3::new(0.0, 0.0, 40.0), "b", "also b"))
    }

    fn room_b() -> Room {
        Room::new("b", "B", "b.jpg").with_hotspot(Hotspot::new(
            Vec3::new(-40.0, 0.0, 0.0),
            "a",
            "to a",
        ))
    }

    fn mounted() -> (Renderer<u32>, RecordingBackend) {
        let mut backend = RecordingBackend::default();
        let mut renderer = Renderer::new(&ViewerSettings::default());
        renderer.mount(&mut backend);
        renderer.resize(800.0, 600.0);
        (renderer, backend)
    }

    #[test]
    fn test_last_load_wins() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        let b = renderer.begin_load(&room_b()).unwrap();
        assert!(a.ticket < b.ticket);

        // B resolves first, then the stale A.
        let outcome = renderer.complete_load(b.ticket, Ok(image()), &mut backend);
        assert!(matches!(outcome, LoadOutcome::Applied { .. }));
        let outcome = renderer.complete_load(a.ticket, Ok(image()), &mut backend);
        assert_eq!(outcome, LoadOutcome::Superseded);

        assert_eq!(backend.bound_room(), Some(RoomId::from("b")));
        assert_eq!(renderer.displayed_room(), Some(&RoomId::from("b")));
    }

    #[test]
    fn test_stale_load_after_newer_completes_out_of_order() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        let b = renderer.begin_load(&room_b()).unwrap();

        // A resolves first but is already stale.
        assert_eq!(
            renderer.complete_load(a.ticket, Ok(image()), &mut backend),
            LoadOutcome::Superseded
        );
        assert_eq!(backend.bound_room(), None);
        assert!(renderer.is_loading());

        renderer.complete_load(b.ticket, Ok(image()), &mut backend);
        assert_eq!(backend.bound_room(), Some(RoomId::from("b")));
        assert!(!renderer.is_loading());
    }

    #[test]
    fn test_room_change_releases_previous_resources() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        renderer.complete_load(a.ticket, Ok(image()), &mut backend);
        assert_eq!(backend.live_markers().len(), 2);

        let b = renderer.begin_load(&room_b()).unwrap();
        renderer.complete_load(b.ticket, Ok(image()), &mut backend);

        let markers = backend.live_markers();
        assert_eq!(markers, vec![HotspotId::new(RoomId::from("b"), 0)]);
        // Sphere, B's texture and one marker.
        assert_eq!(backend.live.len(), 3);
        assert_eq!(renderer.arena().len(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_room() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        renderer.complete_load(a.ticket, Ok(image()), &mut backend);

        let b = renderer.begin_load(&room_b()).unwrap();
        let err = SceneLoadError::new("b.jpg", SceneLoadErrorKind::HttpStatus(404));
        let outcome = renderer.complete_load(b.ticket, Err(err), &mut backend);

        let LoadOutcome::Failed(e) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(e.room, Some(RoomId::from("b")));
        assert_eq!(backend.bound_room(), Some(RoomId::from("a")));
        assert_eq!(backend.live_markers().len(), 2);
        assert_eq!(renderer.displayed_room(), Some(&RoomId::from("a")));
    }

    #[test]
    fn test_reloading_same_room_rebuilds_markers() {
        let (mut renderer, mut backend) = mounted();
        for _ in 0..2 {
            let a = renderer.begin_load(&room_a()).unwrap();
            renderer.complete_load(a.ticket, Ok(image()), &mut backend);
        }
        assert_eq!(backend.live.len(), 4);
        assert_eq!(backend.live_markers().len(), 2);
    }

    #[test]
    fn test_frame_pulses_markers_and_poses_camera() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        renderer.complete_load(a.ticket, Ok(image()), &mut backend);

        let pose = renderer
            .frame(0.5, &Orientation::new(90.0, 0.0), &mut backend)
            .unwrap();
        assert!((pose.target - Vec3::new(0.0, 0.0, 500.0)).length() < 1e-2);
        assert_eq!(pose.position, Vec3::ZERO);

        let expected = 1.0 + (0.5f32 * 3.0).sin() * 0.1;
        for (_, handle) in renderer.arena().markers() {
            assert!((backend.scales[handle] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_frame_before_first_load_is_safe() {
        let (mut renderer, mut backend) = mounted();
        assert!(
            renderer
                .frame(0.0, &Orientation::default(), &mut backend)
                .is_some()
        );
        assert!(renderer.pick(Vec2::new(400.0, 300.0), &Orientation::default()).is_none());
    }

    #[test]
    fn test_dispose_twice_is_noop() {
        let (mut renderer, mut backend) = mounted();
        let a = renderer.begin_load(&room_a()).unwrap();
        renderer.complete_load(a.ticket, Ok(image()), &mut backend);
        let pending = renderer.begin_load(&room_b()).unwrap();

        renderer.dispose(&mut backend);
        renderer.dispose(&mut backend);
        assert!(backend.live.is_empty());
        assert!(renderer.arena().is_empty());

        // Late results and new work are ignored.
        assert_eq!(
            renderer.complete_load(pending.ticket, Ok(image()), &mut backend),
            LoadOutcome::Superseded
        );
        assert!(renderer.begin_load(&room_a()).is_none());
        assert!(
            renderer
                .frame(0.0, &Orientation::default(), &mut backend)
                .is_none()
        );
        assert!(backend.live.is_empty());
    }

    #[test]
    fn test_pick_covers_marker_ring() {
        let (mut renderer, mut backend) = mounted();
        let load = renderer.begin_load(&room_a()).unwrap();
        renderer.complete_load(load.ticket, Ok(image()), &mut backend);
        let centre = Vec2::new(400.0, 300.0);
        let hotspot = Vec3::new(40.0, 0.0, 0.0);

        // Past the sphere (3) but inside the ring band (4..5).
        let on_ring = Orientation::facing(hotspot + Vec3::new(0.0, 0.0, 4.5));
        let hit = renderer.pick(centre, &on_ring).unwrap();
        assert_eq!(hit.id, HotspotId::new(RoomId::from("a"), 0));

        let past_ring = Orientation::facing(hotspot + Vec3::new(0.0, 0.0, 6.0));
        assert!(renderer.pick(centre, &past_ring).is_none());
    }

    #[test]
    fn test_resize_preserves_aspect() {
        let (mut renderer, _) = mounted();
        assert_eq!(renderer.camera().aspect(), 800.0 / 600.0);
        renderer.resize(400.0, 300.0);
        assert_eq!(renderer.camera().aspect(), 400.0 / 300.0);
    }
}
