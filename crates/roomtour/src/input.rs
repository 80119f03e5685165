//! Pointer input: drag-to-orbit, throttled hover tests and hotspot clicks.
//!
//! One gesture spans a pointer-down/up pair. A gesture that changed the
//! orientation is a drag and never navigates; one that did not is a click,
//! and the ray is re-cast at the release point to find the clicked hotspot.

use std::time::Duration;

use glam::Vec2;
use web_time::Instant;

use crate::catalog::HotspotId;
use crate::config::ViewerSettings;
use crate::orientation::Orientation;
use crate::picking::PickHit;
use crate::renderer::Renderer;

/// Anything that can ray-test the current hotspots at a surface point.
pub trait HitTest {
    fn hit_test(&self, screen: Vec2, orientation: &Orientation) -> Option<PickHit>;
}

impl<H> HitTest for Renderer<H> {
    fn hit_test(&self, screen: Vec2, orientation: &Orientation) -> Option<PickHit> {
        self.pick(screen, orientation)
    }
}

/// Limits hover ray tests to one per interval.
#[derive(Debug, Clone)]
pub struct RaycastThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RaycastThrottle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a test may run at `now`. Records the test when it may.
    pub fn ready(&mut self, now: Instant) -> bool {
        if self
            .last
            .is_some_and(|last| now.duration_since(last) < self.interval)
        {
            return false;
        }
        self.last = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging {
        start: Vec2,
        start_orientation: Orientation,
        /// Set once the orientation has differed from `start_orientation`.
        moved: bool,
    },
}

/// Cursor affordance for the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorIcon {
    Grab,
    Grabbing,
    Pointer,
}

#[derive(Debug, Clone)]
pub struct InputController {
    orientation: Orientation,
    gesture: Gesture,
    throttle: RaycastThrottle,
    hovered: Option<HotspotId>,
    pointer: Option<Vec2>,
    sensitivity: f32,
    max_latitude: f32,
}

impl InputController {
    #[must_use]
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            orientation: Orientation::default(),
            gesture: Gesture::Idle,
            throttle: RaycastThrottle::new(settings.raycast_interval()),
            hovered: None,
            pointer: None,
            sensitivity: settings.sensitivity,
            max_latitude: settings.max_latitude,
        }
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.pointer = Some(position);
        self.gesture = Gesture::Dragging {
            start: position,
            start_orientation: self.orientation,
            moved: false,
        };
    }

    /// Orbit while dragging and, at most once per throttle interval,
    /// refresh the hovered hotspot.
    pub fn pointer_move(&mut self, position: Vec2, now: Instant, hits: &impl HitTest) {
        self.pointer = Some(position);

        if let Gesture::Dragging {
            start,
            start_orientation,
            moved,
        } = &mut self.gesture
        {
            let delta = position - *start;
            self.orientation = Orientation::dragged(
                *start_orientation,
                delta.x,
                delta.y,
                self.sensitivity,
                self.max_latitude,
            );
            *moved |= self.orientation != *start_orientation;
        }

        if self.throttle.ready(now) {
            self.hovered = hits
                .hit_test(position, &self.orientation)
                .map(|hit| hit.id);
        }
    }

    /// End the gesture. Returns the clicked hotspot if the gesture was a
    /// click that landed on one.
    pub fn pointer_up(&mut self, position: Vec2, hits: &impl HitTest) -> Option<HotspotId> {
        self.pointer = Some(position);
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Dragging { moved: false, .. } => {
                let hit = hits.hit_test(position, &self.orientation)?;
                self.hovered = Some(hit.id.clone());
                Some(hit.id)
            }
            Gesture::Dragging { moved: true, .. } | Gesture::Idle => None,
        }
    }

    /// The pointer left the surface: end any drag without a click.
    pub fn pointer_leave(&mut self) {
        self.gesture = Gesture::Idle;
        self.pointer = None;
        self.hovered = None;
    }

    /// Forget the hovered hotspot, e.g. after its room was replaced.
    pub fn clear_hover(&mut self) {
        self.hovered = None;
        self.throttle.reset();
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation.clamped(self.max_latitude);
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Dragging { .. })
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&HotspotId> {
        self.hovered.as_ref()
    }

    /// Last pointer position on the surface.
    #[must_use]
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    #[must_use]
    pub fn cursor(&self) -> CursorIcon {
        if self.hovered.is_some() {
            CursorIcon::Pointer
        } else if self.is_dragging() {
            CursorIcon::Grabbing
        } else {
            CursorIcon::Grab
        }
    }
}
