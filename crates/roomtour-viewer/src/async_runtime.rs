//! Background task spawning for native and WASM.
//!
//! Panorama fetch and decode run off the main schedule:
//! - Native: on the Tokio runtime from `bevy_tokio_tasks` (reqwest requires it)
//! - WASM: on Bevy's `AsyncComputeTaskPool` (reqwest uses browser fetch)
//!
//! Results come back over `async_channel`; nothing here touches the world.

use std::future::Future;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Installs the runtime for the current platform.
pub struct AsyncRuntimePlugin;

impl Plugin for AsyncRuntimePlugin {
    fn build(&self, app: &mut App) {
        #[cfg(target_family = "wasm")]
        let _ = app;

        #[cfg(not(target_family = "wasm"))]
        app.add_plugins(bevy_tokio_tasks::TokioTasksPlugin::default());
    }
}

/// Spawns detached background tasks.
#[cfg(not(target_family = "wasm"))]
#[derive(SystemParam)]
pub struct TaskSpawner<'w, 's> {
    runtime: Res<'w, bevy_tokio_tasks::TokioTasksRuntime>,
    #[allow(dead_code)]
    _local: Local<'s, ()>,
}

#[cfg(not(target_family = "wasm"))]
impl TaskSpawner<'_, '_> {
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn_background_task(move |_ctx| future);
    }
}

/// Spawns detached background tasks. The browser is single-threaded, so
/// futures need not be `Send`.
#[cfg(target_family = "wasm")]
#[derive(SystemParam)]
pub struct TaskSpawner<'w, 's> {
    #[allow(dead_code)]
    _local: Local<'s, ()>,
    #[allow(dead_code)]
    _marker: std::marker::PhantomData<&'w ()>,
}

#[cfg(target_family = "wasm")]
impl TaskSpawner<'_, '_> {
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        bevy::tasks::AsyncComputeTaskPool::get()
            .spawn_local(future)
            .detach();
    }
}
