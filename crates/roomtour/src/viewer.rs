//! The composed viewer: catalog, renderer, input and navigation behind a
//! single surface-level API, plus the read-only overlay snapshot the host UI
//! draws from.

use glam::Vec2;
use web_time::Instant;

use crate::camera::CameraPose;
use crate::catalog::{Catalog, Room, RoomId};
use crate::config::{Tour, ViewerSettings};
use crate::error::{Result, SceneLoadError};
use crate::input::{CursorIcon, InputController};
use crate::navigation::Navigation;
use crate::notify::Notifier;
use crate::orientation::Orientation;
use crate::renderer::{LoadOutcome, LoadRequest, LoadTicket, RenderBackend, Renderer};
use crate::source::DecodedImage;

/// Hover label and where the pointer is.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub label: String,
    pub x: f32,
    pub y: f32,
}

/// What the host UI needs to draw around the panorama.
#[derive(Debug, Clone)]
pub struct Overlay<'a> {
    pub current_room: &'a RoomId,
    pub current_room_name: &'a str,
    /// Every room, for a manual room picker.
    pub rooms: &'a [Room],
    pub tooltip: Option<Tooltip>,
    pub loading: bool,
    pub cursor: CursorIcon,
}

#[derive(Debug)]
pub struct Viewer<H> {
    catalog: Catalog,
    settings: ViewerSettings,
    renderer: Renderer<H>,
    input: InputController,
    navigation: Navigation,
    notifier: Notifier,
}

impl<H> Viewer<H> {
    #[must_use]
    pub fn new(tour: Tour, notifier: Notifier) -> Self {
        let Tour {
            catalog,
            start_room,
            settings,
        } = tour;
        Self {
            renderer: Renderer::new(&settings),
            input: InputController::new(&settings),
            navigation: Navigation::new(start_room),
            catalog,
            settings,
            notifier,
        }
    }

    /// Create the sphere and start loading the starting room.
    ///
    /// Returns `None` if already mounted or disposed.
    pub fn mount<B>(&mut self, backend: &mut B) -> Option<LoadRequest>
    where
        B: RenderBackend<Handle = H>,
    {
        if self.renderer.is_mounted() || self.renderer.is_disposed() {
            return None;
        }
        self.renderer.mount(backend);
        let room = self.catalog.room(self.navigation.current())?;
        tracing::info!("Starting tour in '{}'", room.id);
        self.renderer.begin_load(room)
    }

    /// Switch to another room.
    ///
    /// Returns the load to perform, or `None` when there is nothing to do
    /// (the room is already shown or already loading). Unknown ids are
    /// reported to the user and returned as an error; the viewer state is
    /// left alone.
    pub fn navigate_to(&mut self, id: &RoomId) -> Result<Option<LoadRequest>> {
        if self.renderer.is_disposed() {
            return Ok(None);
        }
        let room = match self.catalog.get(id) {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!("Rejected navigation: {}", e);
                self.notifier.error(e.to_string());
                return Err(e);
            }
        };

        let shown = self.renderer.displayed_room() == Some(&room.id);
        let loading = self.navigation.target();
        if (shown && loading.is_none()) || loading == Some(&room.id) {
            return Ok(None);
        }

        self.navigation.request(&self.catalog, &room.id)?;
        Ok(self.renderer.begin_load(room))
    }

    /// Deliver the result of a load requested by [`mount`](Self::mount) or
    /// [`navigate_to`](Self::navigate_to).
    pub fn finish_load<B>(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<DecodedImage, SceneLoadError>,
        backend: &mut B,
    ) -> LoadOutcome
    where
        B: RenderBackend<Handle = H>,
    {
        let outcome = self.renderer.complete_load(ticket, result, backend);
        match &outcome {
            LoadOutcome::Applied { room, .. } => {
                self.navigation.succeed(room);
                self.input.clear_hover();
            }
            LoadOutcome::Failed(e) => {
                let name = e
                    .room
                    .as_ref()
                    .and_then(|id| self.catalog.room(id))
                    .map_or("room", |room| room.name.as_str());
                self.notifier.error(format!("Could not load {name}: {e}"));
                let current = self.navigation.fail();
                tracing::info!("Staying in '{}'", current);
            }
            LoadOutcome::Superseded => {}
        }
        outcome
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.input.pointer_down(position);
    }

    pub fn pointer_move(&mut self, position: Vec2, now: Instant) {
        self.input.pointer_move(position, now, &self.renderer);
    }

    /// End a gesture. A click on a hotspot starts navigation to its target.
    pub fn pointer_up(&mut self, position: Vec2) -> Option<LoadRequest> {
        let clicked = self.input.pointer_up(position, &self.renderer)?;
        let target = self.catalog.hotspot(&clicked)?.target.clone();
        tracing::debug!("Hotspot {} clicked", clicked);
        self.navigate_to(&target).ok().flatten()
    }

    pub fn pointer_leave(&mut self) {
        self.input.pointer_leave();
    }

    /// Point the camera without a gesture.
    pub fn look(&mut self, orientation: Orientation) {
        self.input.set_orientation(orientation);
    }

    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        self.renderer.resize(width, height)
    }

    /// Per-frame update. `elapsed` is seconds since start.
    pub fn frame<B>(&mut self, elapsed: f32, backend: &mut B) -> Option<CameraPose>
    where
        B: RenderBackend<Handle = H>,
    {
        let orientation = self.input.orientation();
        self.renderer.frame(elapsed, &orientation, backend)
    }

    /// Release every resource. Safe to call more than once.
    pub fn dispose<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Handle = H>,
    {
        self.renderer.dispose(backend);
        self.input.pointer_leave();
    }

    #[must_use]
    pub fn overlay(&self) -> Overlay<'_> {
        let current_room = self.active_room();
        let current_room_name = self
            .catalog
            .room(current_room)
            .map_or("", |room| room.name.as_str());

        let tooltip = self
            .input
            .hovered()
            .and_then(|id| self.catalog.hotspot(id))
            .zip(self.input.pointer())
            .map(|(hotspot, pointer)| Tooltip {
                label: hotspot.label.clone(),
                x: pointer.x,
                y: pointer.y,
            });

        Overlay {
            current_room,
            current_room_name,
            rooms: self.catalog.rooms(),
            tooltip,
            loading: self.renderer.is_loading(),
            cursor: self.input.cursor(),
        }
    }

    /// The room the viewer is in. During a transition this is the room
    /// being left.
    #[must_use]
    pub fn active_room(&self) -> &RoomId {
        self.navigation.current()
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.input.orientation()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    #[must_use]
    pub fn input(&self) -> &InputController {
        &self.input
    }

    #[must_use]
    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }
}
