//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available) and
//! images are fetched relative to the page origin.

use std::path::PathBuf;

use bevy::prelude::*;
use roomtour::{CatalogError, RoomId, Tour};

/// Directory that relative image URIs resolve against on native.
const DEFAULT_ASSET_ROOT: &str = "assets";

/// Launch parameters for the viewer.
#[derive(Resource, Debug, Clone)]
pub struct LaunchParams {
    /// Tour file to load instead of the built-in tour.
    pub tour: Option<PathBuf>,
    /// Room to start in.
    pub start_room: Option<RoomId>,
    /// Directory for relative image URIs (native only).
    pub asset_root: Option<PathBuf>,
    /// Base URL for relative image URIs.
    pub asset_base_url: Option<String>,
    /// Override for the hover ray-test interval.
    pub raycast_interval_ms: Option<u64>,
    /// Override for the drag sensitivity (degrees per pixel).
    pub sensitivity: Option<f32>,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            tour: None,
            start_room: None,
            asset_root: Some(PathBuf::from(DEFAULT_ASSET_ROOT)),
            asset_base_url: None,
            raycast_interval_ms: None,
            sensitivity: None,
        }
    }
}

impl LaunchParams {
    /// Build the tour described by these parameters.
    pub fn load_tour(&self) -> Result<Tour, CatalogError> {
        let mut tour = match &self.tour {
            #[cfg(not(target_family = "wasm"))]
            Some(path) => Tour::from_path(path)?,
            #[cfg(target_family = "wasm")]
            Some(_) => Tour::builtin(),
            None => Tour::builtin(),
        };

        if let Some(start) = &self.start_room {
            tour = tour.with_start_room(start.clone())?;
        }
        if let Some(interval) = self.raycast_interval_ms {
            tour.settings.raycast_interval_ms = interval;
        }
        if let Some(sensitivity) = self.sensitivity {
            tour.settings.sensitivity = sensitivity;
        }
        Ok(tour)
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Panoramic room-tour viewer")]
    struct CliArgs {
        /// Tour file (JSON). Uses the built-in tour when omitted.
        #[arg(long)]
        tour: Option<PathBuf>,

        /// Room to start in. Defaults to the tour's start room.
        #[arg(long)]
        start_room: Option<String>,

        /// Directory that relative image URIs are read from.
        #[arg(long, default_value = DEFAULT_ASSET_ROOT)]
        asset_root: PathBuf,

        /// Fetch relative image URIs from this base URL instead of the
        /// asset directory.
        #[arg(long)]
        asset_base_url: Option<String>,

        /// Minimum time between hover ray tests, in milliseconds.
        #[arg(long)]
        raycast_interval_ms: Option<u64>,

        /// Drag sensitivity in degrees per pixel.
        #[arg(long)]
        sensitivity: Option<f32>,
    }

    pub fn parse() -> LaunchParams {
        let args = CliArgs::parse();
        // A base URL takes over relative URIs from the asset directory.
        let asset_root = args.asset_base_url.is_none().then_some(args.asset_root);
        LaunchParams {
            tour: args.tour,
            start_room: args.start_room.map(RoomId::from),
            asset_root,
            asset_base_url: args.asset_base_url,
            raycast_interval_ms: args.raycast_interval_ms,
            sensitivity: args.sensitivity,
        }
    }
}

#[cfg(target_family = "wasm")]
mod wasm {
    use wasm_bindgen::JsValue;

    use super::*;

    /// The page origin (`window.location.origin`), if available.
    fn page_origin() -> Option<String> {
        let location = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("location")).ok()?;
        js_sys::Reflect::get(&location, &JsValue::from_str("origin"))
            .ok()?
            .as_string()
    }

    pub fn parse() -> LaunchParams {
        LaunchParams {
            asset_root: None,
            asset_base_url: page_origin(),
            ..LaunchParams::default()
        }
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        wasm::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply_to_builtin_tour() {
        let params = LaunchParams {
            start_room: Some(RoomId::from("room2")),
            raycast_interval_ms: Some(80),
            sensitivity: Some(0.25),
            ..LaunchParams::default()
        };
        let tour = params.load_tour().unwrap();
        assert_eq!(tour.start_room, RoomId::from("room2"));
        assert_eq!(tour.settings.raycast_interval_ms, 80);
        assert!((tour.settings.sensitivity - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_start_room_is_configuration_error() {
        let params = LaunchParams {
            start_room: Some(RoomId::from("cellar")),
            ..LaunchParams::default()
        };
        assert!(matches!(
            params.load_tour(),
            Err(CatalogError::UnknownRoom { .. })
        ));
    }
}
