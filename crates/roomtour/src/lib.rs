//! Engine-independent core of the panoramic room-tour viewer.
//!
//! A tour is a set of rooms, each an equirectangular panorama projected onto
//! the inside of a sphere, linked by clickable hotspots. This crate holds
//! every piece of viewer logic that does not need a GPU:
//!
//! - orbit orientation and the panorama camera,
//! - ray picking of hotspot markers,
//! - the renderer state machine, which drives a [`RenderBackend`],
//! - pointer gesture handling and room navigation,
//! - image fetch and decode.
//!
//! # Design principles
//!
//! - **Backend-agnostic**: GPU work goes through [`RenderBackend`]; tests use
//!   a recording double, the viewer binary uses Bevy
//! - **Async sources**: Image sources return `impl Future`. On native the
//!   HTTP and file sources expect a Tokio runtime (reqwest needs one anyway)
//! - **Last load wins**: every load carries a [`LoadTicket`] and only the
//!   newest one is applied
//!
//! # Example
//!
//! ```ignore
//! use roomtour::{Notifier, Tour, Viewer};
//!
//! let tour = Tour::builtin();
//! let (notifier, notices) = Notifier::channel(tour.settings.toast_duration());
//! let mut viewer = Viewer::new(tour, notifier);
//! if let Some(request) = viewer.mount(&mut backend) {
//!     let image = load_panorama(&source, &request.uri, 4096).await;
//!     viewer.finish_load(request.ticket, image, &mut backend);
//! }
//! ```

pub mod arena;
pub mod camera;
pub mod catalog;
pub mod config;
mod error;
pub mod geometry;
pub mod input;
pub mod navigation;
pub mod notify;
pub mod orientation;
pub mod picking;
pub mod renderer;
pub mod source;
pub mod viewer;

pub use camera::{CameraPose, PanoramaCamera};
pub use catalog::{Catalog, Hotspot, HotspotId, Room, RoomId};
pub use config::{Tour, TourFile, ViewerSettings};
pub use error::{CatalogError, Result, SceneLoadError, SceneLoadErrorKind};
pub use geometry::{SphereGeometry, panorama_sphere};
pub use input::CursorIcon;
pub use navigation::{NavState, Navigation};
pub use notify::{Notice, NoticeLevel, Notifier, Toasts};
pub use orientation::Orientation;
pub use renderer::{LoadOutcome, LoadRequest, LoadTicket, MarkerStyle, RenderBackend, Renderer};
pub use source::{DecodedImage, ImageSource, load_panorama};
pub use viewer::{Overlay, Tooltip, Viewer};
