//! Fetching and decoding panorama images.
//!
//! Sources only produce bytes; [`decode_image`] turns them into RGBA pixels
//! and is synchronous so callers can run it wherever their executor allows.

use std::future::Future;

use crate::error::{SceneLoadError, SceneLoadErrorKind};

/// An RGBA8 image ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Something that can produce the raw bytes behind an image URI.
pub trait ImageSource {
    fn fetch(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, SceneLoadError>>;
}

/// Fetches images over HTTP, resolving relative URIs against a base URL.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpImageSource {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    /// Absolute URL for `uri`, if one can be formed.
    #[must_use]
    pub fn resolve(&self, uri: &str) -> Option<String> {
        if is_http(uri) {
            return Some(uri.to_string());
        }
        let base = self.base_url.as_deref()?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            uri.trim_start_matches('/')
        ))
    }
}

impl ImageSource for HttpImageSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, SceneLoadError> {
        let url = self
            .resolve(uri)
            .ok_or_else(|| SceneLoadError::new(uri, SceneLoadErrorKind::Unsupported))?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SceneLoadError::new(uri, SceneLoadErrorKind::Http(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SceneLoadError::new(
                uri,
                SceneLoadErrorKind::HttpStatus(status.as_u16()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SceneLoadError::new(uri, SceneLoadErrorKind::Http(e.to_string())))?;
        Ok(bytes.to_vec())
    }
}

/// Reads images relative to a local asset directory.
///
/// Reads go through `tokio::fs`, so fetches must run inside a Tokio runtime.
#[cfg(not(target_family = "wasm"))]
#[derive(Debug, Clone)]
pub struct FileImageSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_family = "wasm"))]
impl FileImageSource {
    #[must_use]
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn resolve(&self, uri: &str) -> std::path::PathBuf {
        let relative = uri.strip_prefix("file://").unwrap_or(uri);
        self.root.join(relative.trim_start_matches('/'))
    }
}

#[cfg(not(target_family = "wasm"))]
impl ImageSource for FileImageSource {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, SceneLoadError> {
        let path = self.resolve(uri);
        tokio::fs::read(&path)
            .await
            .map_err(|e| SceneLoadError::new(uri, SceneLoadErrorKind::Io(e.to_string())))
    }
}

/// Routes a URI to HTTP or the local asset directory.
///
/// `http://` and `https://` URIs always go over the network. Other URIs go
/// to the asset directory when one is configured, and are otherwise joined
/// onto the HTTP base URL.
#[derive(Debug, Clone)]
pub struct UriImageSource {
    http: HttpImageSource,
    #[cfg(not(target_family = "wasm"))]
    files: Option<FileImageSource>,
}

impl UriImageSource {
    #[must_use]
    pub fn new(http: HttpImageSource) -> Self {
        Self {
            http,
            #[cfg(not(target_family = "wasm"))]
            files: None,
        }
    }

    #[cfg(not(target_family = "wasm"))]
    #[must_use]
    pub fn with_files(mut self, files: FileImageSource) -> Self {
        self.files = Some(files);
        self
    }
}

impl ImageSource for UriImageSource {
    #[cfg(not(target_family = "wasm"))]
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, SceneLoadError> {
        match &self.files {
            Some(files) if !is_http(uri) => files.fetch(uri).await,
            _ => self.http.fetch(uri).await,
        }
    }

    #[cfg(target_family = "wasm")]
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, SceneLoadError> {
        self.http.fetch(uri).await
    }
}

fn is_http(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Decode an encoded panorama into RGBA8, downscaling so neither side
/// exceeds `max_size`.
pub fn decode_image(uri: &str, bytes: &[u8], max_size: u32) -> Result<DecodedImage, SceneLoadError> {
    let mut image = image::load_from_memory(bytes)
        .map_err(|e| SceneLoadError::new(uri, SceneLoadErrorKind::Decode(e.to_string())))?;

    if image.width() > max_size || image.height() > max_size {
        let (width, height) = (image.width(), image.height());
        image = image.resize(max_size, max_size, image::imageops::FilterType::Triangle);
        tracing::debug!(
            "Downscaled {uri} from {width}x{height} to {}x{}",
            image.width(),
            image.height()
        );
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage::new(rgba.into_raw(), width, height))
}

/// Fetch and decode one panorama.
pub async fn load_panorama<S: ImageSource>(
    source: &S,
    uri: &str,
    max_size: u32,
) -> Result<DecodedImage, SceneLoadError> {
    let bytes = source.fetch(uri).await?;
    decode_image(uri, &bytes, max_size)
}
