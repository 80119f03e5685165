//! Error types for the roomtour crate.

use std::fmt;

use crate::catalog::RoomId;

/// Result type for catalog construction and lookups.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors in the tour definition.
///
/// These are configuration errors: they are detected once, when the catalog
/// is built, and the viewer refuses to start rather than render dead hotspots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The tour contains no rooms.
    Empty,
    /// Two rooms share the same id.
    DuplicateRoom {
        /// The repeated id.
        id: RoomId,
    },
    /// A hotspot points at a room that does not exist.
    UnknownTarget {
        /// Room owning the hotspot.
        room: RoomId,
        /// Position of the hotspot within its room.
        hotspot: usize,
        /// The unresolved target id.
        target: RoomId,
    },
    /// A lookup or navigation request named a room that does not exist.
    UnknownRoom {
        /// The requested id.
        id: RoomId,
    },
    /// The tour file could not be parsed.
    Parse {
        /// Where the tour came from.
        context: String,
        /// The parser message.
        message: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "tour contains no rooms"),
            CatalogError::DuplicateRoom { id } => write!(f, "room id '{id}' is defined twice"),
            CatalogError::UnknownTarget {
                room,
                hotspot,
                target,
            } => write!(
                f,
                "hotspot {hotspot} in room '{room}' targets unknown room '{target}'"
            ),
            CatalogError::UnknownRoom { id } => write!(f, "unknown room '{id}'"),
            CatalogError::Parse { context, message } => {
                write!(f, "failed to parse {context}: {message}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// What went wrong while loading a panorama.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneLoadErrorKind {
    /// The HTTP request failed before a response arrived.
    Http(String),
    /// The server answered with a non-success status.
    HttpStatus(u16),
    /// Reading a local asset failed.
    Io(String),
    /// The bytes are not a decodable image.
    Decode(String),
    /// The URI cannot be fetched by any configured source.
    Unsupported,
}

/// A panorama image could not be fetched or decoded.
///
/// Recoverable: the previous room stays on screen and the user may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLoadError {
    /// Room whose image failed.
    pub room: Option<RoomId>,
    /// URI that was requested.
    pub uri: String,
    /// Failure detail.
    pub kind: SceneLoadErrorKind,
}

impl SceneLoadError {
    /// Create an error for a URI not yet associated with a room.
    pub fn new(uri: impl Into<String>, kind: SceneLoadErrorKind) -> Self {
        Self {
            room: None,
            uri: uri.into(),
            kind,
        }
    }

    /// Attach the room that requested the image.
    #[must_use]
    pub fn for_room(mut self, room: RoomId) -> Self {
        self.room = Some(room);
        self
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uri = &self.uri;
        match &self.kind {
            SceneLoadErrorKind::Http(message) => write!(f, "request for {uri} failed: {message}"),
            SceneLoadErrorKind::HttpStatus(status) => {
                write!(f, "request for {uri} returned status {status}")
            }
            SceneLoadErrorKind::Io(message) => write!(f, "failed to read {uri}: {message}"),
            SceneLoadErrorKind::Decode(message) => {
                write!(f, "failed to decode {uri}: {message}")
            }
            SceneLoadErrorKind::Unsupported => write!(f, "no image source can fetch {uri}"),
        }?;
        if let Some(room) = &self.room {
            write!(f, " (room '{room}')")?;
        }
        Ok(())
    }
}

impl std::error::Error for SceneLoadError {}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Parse {
            context: "tour json".to_string(),
            message: e.to_string(),
        }
    }
}
