//! Pointer input: feeds cursor motion and the orbit button into the viewer.
//!
//! Actions are declared with `leafwing-input-manager` so they can be rebound;
//! the cursor position itself comes from the primary window.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use leafwing_input_manager::prelude::*;
use web_time::Instant;

use crate::loader::PendingLoads;
use crate::{TourSet, TourViewer};

/// Viewer actions.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum TourAction {
    /// Drag to look around, click to follow a hotspot (left mouse).
    Orbit,
    /// Toggle the overlay (Q).
    ToggleUi,
}

/// Create the default input map for viewer actions.
pub fn default_input_map() -> InputMap<TourAction> {
    InputMap::default()
        .with(TourAction::Orbit, MouseButton::Left)
        .with(TourAction::ToggleUi, KeyCode::KeyQ)
}

/// Plugin for pointer input.
pub struct PointerInputPlugin;

impl Plugin for PointerInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<TourAction>::default())
            .add_systems(Update, pointer_input.in_set(TourSet::Input));
    }
}

/// Translate window cursor state into viewer pointer events.
///
/// The pointer counts as absent while it is over egui, unless a drag is in
/// progress (drags keep going under the overlay).
fn pointer_input(
    action_query: Query<&ActionState<TourAction>>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
    mut viewer: ResMut<TourViewer>,
    mut pending: ResMut<PendingLoads>,
    mut last_cursor: Local<Option<Vec2>>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    let egui_wants_pointer = contexts
        .ctx_mut()
        .ok()
        .is_some_and(|ctx| ctx.is_pointer_over_area());
    let cursor = window
        .cursor_position()
        .filter(|_| viewer.input().is_dragging() || !egui_wants_pointer);

    match (cursor, *last_cursor) {
        (None, Some(_)) => viewer.pointer_leave(),
        (Some(position), previous) if previous != Some(position) => {
            viewer.pointer_move(position, Instant::now());
        }
        _ => {}
    }
    *last_cursor = cursor;

    let Some(position) = cursor else {
        return;
    };
    if action_state.just_pressed(&TourAction::Orbit) {
        viewer.pointer_down(position);
    }
    if action_state.just_released(&TourAction::Orbit)
        && let Some(request) = viewer.pointer_up(position)
    {
        pending.push(request);
    }
}
