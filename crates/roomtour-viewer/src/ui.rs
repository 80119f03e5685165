//! Tour overlay: room list, hotspot tooltip, loading indicator and toasts.
//!
//! Everything shown here is read from [`roomtour::Overlay`] once per frame;
//! the only thing the overlay writes back is a navigation request when a
//! room is picked from the list.

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use leafwing_input_manager::prelude::ActionState;
use roomtour::{CursorIcon, LoadRequest, Notice, NoticeLevel, RoomId, Toasts, Viewer};
use web_time::Instant;

use crate::TourViewer;
use crate::input::TourAction;
use crate::loader::PendingLoads;

/// Plugin for the tour overlay.
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .init_resource::<UiState>()
            .add_systems(Update, toggle_ui)
            .add_systems(EguiPrimaryContextPass, overlay_ui_system);
    }
}

/// Receiving end of the notifier owned by the viewer.
#[derive(Resource)]
pub struct NoticeReceiver(pub async_channel::Receiver<Notice>);

#[derive(Resource)]
struct UiState {
    /// Whether the title bar and room list are shown.
    visible: bool,
    toasts: Toasts,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            visible: true,
            toasts: Toasts::new(),
        }
    }
}

fn toggle_ui(action_query: Query<&ActionState<TourAction>>, mut ui_state: ResMut<UiState>) {
    let Ok(action_state) = action_query.single() else {
        return;
    };
    if action_state.just_pressed(&TourAction::ToggleUi) {
        ui_state.visible = !ui_state.visible;
    }
}

fn egui_cursor(cursor: CursorIcon) -> egui::CursorIcon {
    match cursor {
        CursorIcon::Grab => egui::CursorIcon::Grab,
        CursorIcon::Grabbing => egui::CursorIcon::Grabbing,
        CursorIcon::Pointer => egui::CursorIcon::PointingHand,
    }
}

fn notice_color(level: NoticeLevel) -> egui::Color32 {
    match level {
        NoticeLevel::Success => egui::Color32::from_rgb(52, 199, 89),
        NoticeLevel::Error => egui::Color32::from_rgb(255, 69, 58),
        NoticeLevel::Info => egui::Color32::from_rgb(10, 132, 255),
    }
}

/// Ask the viewer for a room picked from the list.
///
/// The active room is not filtered out: after a failed load it has nothing
/// on screen and picking it retries. The viewer ignores a room that is
/// already shown or loading, and reports unknown ids itself.
fn open_room<H>(viewer: &mut Viewer<H>, id: &RoomId) -> Option<LoadRequest> {
    viewer.navigate_to(id).ok().flatten()
}

/// Render the overlay.
fn overlay_ui_system(
    mut contexts: EguiContexts,
    mut viewer: ResMut<TourViewer>,
    mut ui_state: ResMut<UiState>,
    mut pending: ResMut<PendingLoads>,
    notices: Res<NoticeReceiver>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    ui_state.toasts.update(&notices.0, Instant::now());

    let tooltip_offset = viewer.settings().tooltip_offset;
    let mut selected: Option<RoomId> = None;

    {
        let overlay = viewer.overlay();

        if ui_state.visible {
            egui::TopBottomPanel::top("tour_title").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(overlay.current_room_name);
                    if overlay.loading {
                        ui.spinner();
                    }
                });
                ui.label("Drag to look around. Click a marker to walk through. Q hides this panel.");
            });

            egui::Window::new("Rooms")
                .default_pos([10.0, 80.0])
                .resizable(false)
                .show(ctx, |ui| {
                    for room in overlay.rooms {
                        let active = &room.id == overlay.current_room;
                        let label = format!("{} ({} hotspots)", room.name, room.hotspots.len());
                        if ui.selectable_label(active, label).clicked() {
                            selected = Some(room.id.clone());
                        }
                    }
                });
        }

        if let Some(tooltip) = &overlay.tooltip {
            egui::Area::new(egui::Id::new("hotspot_tooltip"))
                .order(egui::Order::Tooltip)
                .interactable(false)
                .fixed_pos(egui::pos2(
                    tooltip.x + tooltip_offset,
                    tooltip.y + tooltip_offset,
                ))
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(&tooltip.label);
                    });
                });
        }

        if overlay.loading {
            egui::Area::new(egui::Id::new("loading"))
                .order(egui::Order::Foreground)
                .interactable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading...");
                        });
                    });
                });
        }

        if !ctx.is_pointer_over_area() {
            ctx.set_cursor_icon(egui_cursor(overlay.cursor));
        }
    }

    if !ui_state.toasts.is_empty() {
        egui::Area::new(egui::Id::new("toasts"))
            .order(egui::Order::Foreground)
            .interactable(false)
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .show(ctx, |ui| {
                for notice in ui_state.toasts.iter() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(&notice.message).color(notice_color(notice.level)),
                        );
                    });
                }
            });
    }

    if let Some(request) = selected.and_then(|id| open_room(&mut viewer.0, &id)) {
        pending.push(request);
    }

    Ok(())
}
