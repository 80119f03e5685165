//! Panoramic room-tour viewer using Bevy.
//!
//! Each room is an equirectangular photo mapped onto the inside of a sphere
//! around the camera. Drag to look around; click a hotspot marker to move to
//! the room it leads to.

mod async_runtime;
mod input;
mod launch_params;
mod loader;
mod scene;
mod ui;

use async_runtime::AsyncRuntimePlugin;
use bevy::camera::ClearColorConfig;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use input::PointerInputPlugin;
use loader::{PanoramaLoaderPlugin, PendingLoads};
use roomtour::{Notifier, Viewer};
use scene::{HotspotMarker, SceneBackend, SceneHandle};
use ui::{NoticeReceiver, OverlayPlugin};

/// The tour viewer state, driven by the systems below.
#[derive(Resource, Deref, DerefMut)]
pub struct TourViewer(Viewer<SceneHandle>);

/// Per-frame ordering: finished loads land first, then input, then the
/// camera and markers are updated for drawing.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TourSet {
    Load,
    Input,
    Frame,
}

/// Marks the camera that looks out from the sphere centre.
#[derive(Component)]
struct PanoramaView;

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (TourSet::Load, TourSet::Input, TourSet::Frame).chain(),
        )
        .add_plugins((PanoramaLoaderPlugin, PointerInputPlugin, OverlayPlugin))
        .add_systems(Startup, (setup_scene, mount_viewer).chain())
        .add_systems(Update, sync_viewport.before(TourSet::Input))
        .add_systems(Update, update_frame.in_set(TourSet::Frame))
        .add_systems(Last, dispose_on_exit);
    }
}

/// Spawn the panorama camera.
fn setup_scene(mut commands: Commands, viewer: Res<TourViewer>) {
    let settings = viewer.settings();
    commands.spawn((
        Camera3d::default(),
        Camera {
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        Transform::IDENTITY,
        Projection::Perspective(PerspectiveProjection {
            fov: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
            ..Default::default()
        }),
        // Photos are already display-referred.
        Tonemapping::None,
        PanoramaView,
        input::default_input_map(),
    ));

    tracing::info!(
        "Tour ready with {} rooms - drag to look around, click markers to move",
        viewer.catalog().rooms().len()
    );
}

/// Create the sphere and request the start room.
fn mount_viewer(
    mut viewer: ResMut<TourViewer>,
    mut backend: SceneBackend,
    mut pending: ResMut<PendingLoads>,
) {
    if let Some(request) = viewer.mount(&mut backend) {
        pending.push(request);
    }
}

/// Keep the core camera's viewport in step with the window.
fn sync_viewport(window: Single<&Window, With<PrimaryWindow>>, mut viewer: ResMut<TourViewer>) {
    let size = Vec2::new(window.width(), window.height());
    if viewer.renderer().camera().viewport() != size && viewer.resize(size.x, size.y) {
        tracing::debug!("Viewport resized to {}x{}", size.x, size.y);
    }
}

/// Advance marker animation and aim the camera.
fn update_frame(
    time: Res<Time>,
    mut viewer: ResMut<TourViewer>,
    mut backend: SceneBackend,
    mut camera: Single<&mut Transform, (With<PanoramaView>, Without<HotspotMarker>)>,
) {
    if let Some(pose) = viewer.frame(time.elapsed_secs(), &mut backend) {
        **camera = Transform::from_translation(pose.position).looking_at(pose.target, pose.up);
    }
}

/// Release every scene resource when the app exits.
fn dispose_on_exit(
    mut exit: MessageReader<AppExit>,
    mut viewer: ResMut<TourViewer>,
    mut backend: SceneBackend,
) {
    if exit.read().count() > 0 {
        viewer.dispose(&mut backend);
        tracing::info!("Viewer disposed");
    }
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    // A broken tour is fatal before any window opens.
    let tour = match params.load_tour() {
        Ok(tour) => tour,
        Err(e) => {
            tracing::error!("Invalid tour: {e}");
            std::process::exit(1);
        }
    };

    let (notifier, notices) = Notifier::channel(tour.settings.toast_duration());
    let viewer = Viewer::new(tour, notifier);

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "roomtour".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    // The loader reads these while the plugins are built.
    app.insert_resource(params)
        .insert_resource(TourViewer(viewer))
        .insert_resource(NoticeReceiver(notices));

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }));

    // Add async runtime (Tokio on native, no-op on WASM).
    app.add_plugins(AsyncRuntimePlugin);

    app.add_plugins(AppPlugin).run();
}
