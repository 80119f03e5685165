//! Room navigation state machine.
//!
//! ```text
//!              request(t)                    succeed
//! Ready(c) ───────────────▶ Loading(t, c) ───────────▶ Ready(t)
//!                              │    ▲
//!                         fail │    │ request(t'): supersedes t
//!                              ▼    │
//!                           Ready(c)
//! ```
//!
//! The machine only tracks which room is wanted and which is shown; the
//! renderer performs the loads.

use crate::catalog::{Catalog, RoomId};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    /// A room is being loaded. `fallback` is the room to return to on
    /// failure; `None` before the first room was shown.
    Loading {
        target: RoomId,
        fallback: Option<RoomId>,
    },
    Ready(RoomId),
}

#[derive(Debug, Clone)]
pub struct Navigation {
    state: NavState,
}

impl Navigation {
    /// Start out loading `start`.
    #[must_use]
    pub fn new(start: RoomId) -> Self {
        Self {
            state: NavState::Loading {
                target: start,
                fallback: None,
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Ask for `target`. Unknown rooms are rejected without a state change.
    pub fn request(&mut self, catalog: &Catalog, target: &RoomId) -> Result<()> {
        let target = catalog.get(target)?.id.clone();
        let fallback = match &self.state {
            NavState::Ready(current) => Some(current.clone()),
            NavState::Loading { fallback, .. } => fallback.clone(),
        };
        tracing::info!("Navigating to '{}'", target);
        self.state = NavState::Loading { target, fallback };
        Ok(())
    }

    /// The load of `room` finished. Returns `false` if `room` is no longer
    /// the target.
    pub fn succeed(&mut self, room: &RoomId) -> bool {
        match &self.state {
            NavState::Loading { target, .. } if target == room => {
                self.state = NavState::Ready(room.clone());
                true
            }
            _ => false,
        }
    }

    /// The current load failed. Returns the room now considered active.
    pub fn fail(&mut self) -> &RoomId {
        if let NavState::Loading { target, fallback } = &self.state {
            let room = fallback.clone().unwrap_or_else(|| target.clone());
            self.state = NavState::Ready(room);
        }
        self.current()
    }

    /// The room the viewer is in: the ready room, or while loading the
    /// fallback (the target for a first load).
    #[must_use]
    pub fn current(&self) -> &RoomId {
        match &self.state {
            NavState::Ready(room) => room,
            NavState::Loading { target, fallback } => fallback.as_ref().unwrap_or(target),
        }
    }

    /// Room being loaded, if any.
    #[must_use]
    pub fn target(&self) -> Option<&RoomId> {
        match &self.state {
            NavState::Loading { target, .. } => Some(target),
            NavState::Ready(_) => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, NavState::Loading { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    fn id(s: &str) -> RoomId {
        RoomId::from(s)
    }

    fn ready(room: &str) -> Navigation {
        let mut nav = Navigation::new(id(room));
        assert!(nav.succeed(&id(room)));
        nav
    }

    #[test]
    fn test_starts_loading_first_room() {
        let nav = Navigation::new(id("room1"));
        assert!(nav.is_loading());
        assert_eq!(nav.target(), Some(&id("room1")));
        assert_eq!(nav.current(), &id("room1"));
    }

    #[test]
    fn test_request_then_succeed() {
        let catalog = Catalog::builtin();
        let mut nav = ready("room1");
        nav.request(&catalog, &id("room2")).unwrap();
        assert_eq!(
            nav.state(),
            &NavState::Loading {
                target: id("room2"),
                fallback: Some(id("room1")),
            }
        );
        assert_eq!(nav.current(), &id("room1"));
        assert!(nav.succeed(&id("room2")));
        assert_eq!(nav.state(), &NavState::Ready(id("room2")));
    }

    #[test]
    fn test_failure_returns_to_previous_room() {
        let catalog = Catalog::builtin();
        let mut nav = ready("room1");
        nav.request(&catalog, &id("room2")).unwrap();
        assert_eq!(nav.fail(), &id("room1"));
        assert_eq!(nav.state(), &NavState::Ready(id("room1")));
    }

    #[test]
    fn test_first_load_failure_stays_on_target() {
        let mut nav = Navigation::new(id("room1"));
        assert_eq!(nav.fail(), &id("room1"));
        assert!(!nav.is_loading());
    }

    #[test]
    fn test_supersede_keeps_fallback() {
        let catalog = Catalog::builtin();
        let mut nav = ready("room1");
        nav.request(&catalog, &id("room2")).unwrap();
        nav.request(&catalog, &id("room3")).unwrap();
        assert_eq!(nav.target(), Some(&id("room3")));

        // The superseded room finishing is not a transition.
        assert!(!nav.succeed(&id("room2")));
        assert_eq!(nav.fail(), &id("room1"));
    }

    #[test]
    fn test_unknown_room_rejected() {
        let catalog = Catalog::builtin();
        let mut nav = ready("room1");
        let err = nav.request(&catalog, &id("attic")).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownRoom { .. }));
        assert_eq!(nav.state(), &NavState::Ready(id("room1")));
    }
}
