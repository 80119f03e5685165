//! Panorama loading.
//!
//! Load requests from the viewer are fetched and decoded on a background task;
//! results come back over a channel and are applied at the start of the next
//! `Update`, before the frame that should show them.

use std::sync::Arc;

use bevy::prelude::*;
use roomtour::source::{HttpImageSource, UriImageSource};
use roomtour::{DecodedImage, LoadOutcome, LoadRequest, LoadTicket, SceneLoadError, load_panorama};

use crate::TourViewer;
use crate::async_runtime::TaskSpawner;
use crate::launch_params::LaunchParams;
use crate::scene::SceneBackend;

/// User agent for image requests.
#[cfg(not(target_family = "wasm"))]
const USER_AGENT: &str = "roomtour-viewer/0.1 (https://github.com/roomtour/roomtour)";

type LoadResult = (LoadTicket, Result<DecodedImage, SceneLoadError>);

/// Plugin for panorama loading.
pub struct PanoramaLoaderPlugin;

impl Plugin for PanoramaLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanoramaLoader>()
            .init_resource::<PendingLoads>()
            .add_systems(
                Update,
                (start_pending_loads, poll_panorama_loads)
                    .chain()
                    .in_set(crate::TourSet::Load),
            );
    }
}

/// Load requests produced this frame, waiting to be spawned.
#[derive(Resource, Default)]
pub struct PendingLoads(Vec<LoadRequest>);

impl PendingLoads {
    pub fn push(&mut self, request: LoadRequest) {
        self.0.push(request);
    }
}

/// Image source and result channel shared by all loads.
#[derive(Resource)]
pub struct PanoramaLoader {
    source: Arc<UriImageSource>,
    max_texture_size: u32,
    result_tx: async_channel::Sender<LoadResult>,
    result_rx: async_channel::Receiver<LoadResult>,
}

impl FromWorld for PanoramaLoader {
    fn from_world(world: &mut World) -> Self {
        let params = world
            .get_resource::<LaunchParams>()
            .cloned()
            .unwrap_or_default();
        let max_texture_size = world
            .get_resource::<TourViewer>()
            .map_or(roomtour::ViewerSettings::default().max_texture_size, |v| {
                v.settings().max_texture_size
            });

        #[allow(unused_mut)]
        let mut source = UriImageSource::new(HttpImageSource::new(
            http_client(),
            params.asset_base_url.clone(),
        ));
        #[cfg(not(target_family = "wasm"))]
        {
            if let Some(root) = &params.asset_root {
                source = source.with_files(roomtour::source::FileImageSource::new(root.clone()));
            }
        }

        let (result_tx, result_rx) = async_channel::unbounded();
        Self {
            source: Arc::new(source),
            max_texture_size,
            result_tx,
            result_rx,
        }
    }
}

#[cfg(not(target_family = "wasm"))]
fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to configure HTTP client ({e}); using defaults");
            reqwest::Client::new()
        })
}

/// The browser sets the user agent.
#[cfg(target_family = "wasm")]
fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

impl PanoramaLoader {
    /// Fetch and decode `request` in the background.
    pub fn start(&self, request: LoadRequest, spawner: &TaskSpawner<'_, '_>) {
        tracing::debug!("Fetching {} for '{}'", request.uri, request.room);
        let source = Arc::clone(&self.source);
        let tx = self.result_tx.clone();
        let max_size = self.max_texture_size;

        spawner.spawn(async move {
            let result = load_panorama(source.as_ref(), &request.uri, max_size).await;
            let _ = tx.send((request.ticket, result)).await;
        });
    }
}

fn start_pending_loads(
    mut pending: ResMut<PendingLoads>,
    loader: Res<PanoramaLoader>,
    spawner: TaskSpawner,
) {
    for request in pending.0.drain(..) {
        loader.start(request, &spawner);
    }
}

/// Apply finished loads to the viewer.
fn poll_panorama_loads(
    loader: Res<PanoramaLoader>,
    mut viewer: ResMut<TourViewer>,
    mut backend: SceneBackend,
) {
    while let Ok((ticket, result)) = loader.result_rx.try_recv() {
        match viewer.finish_load(ticket, result, &mut backend) {
            LoadOutcome::Applied { room, previous } => {
                tracing::info!(
                    "Entered '{}'{}",
                    room,
                    previous.map(|p| format!(" from '{p}'")).unwrap_or_default()
                );
            }
            LoadOutcome::Superseded => tracing::debug!("Discarded stale panorama"),
            LoadOutcome::Failed(_) => {}
        }
    }
}
