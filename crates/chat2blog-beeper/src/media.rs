//! Media handles and downloaded media.

use std::path::Path;

use bytes::Bytes;

/// Content type used when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Known MIME types and their canonical file extensions.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
    ("image/avif", "avif"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
    ("image/tiff", "tiff"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("video/webm", "webm"),
    ("video/x-msvideo", "avi"),
    ("video/x-matroska", "mkv"),
    ("video/3gpp", "3gp"),
];

/// Returns the canonical extension for a MIME type.
#[must_use]
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == mime_type)
        .map(|(_, ext)| *ext)
}

/// Guesses a MIME type from a file path's extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };
    let ext = ext.to_ascii_lowercase();
    let ext = match ext.as_str() {
        "jpeg" => "jpg",
        "tif" => "tiff",
        other => other,
    };

    MIME_EXTENSIONS
        .iter()
        .find(|(_, e)| *e == ext)
        .map_or(OCTET_STREAM, |(mime, _)| *mime)
}

/// How a media handle has to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleScheme {
    /// `mxc://` Matrix content handle.
    Mxc,
    /// `localmxc://` handle for media cached by Beeper Desktop.
    LocalMxc,
    /// `file://` URL.
    File,
    /// `http://` or `https://` URL.
    Http,
    /// Absolute filesystem path.
    AbsolutePath,
    /// Anything else; resolved against the API base.
    Relative,
}

impl HandleScheme {
    /// Classifies a media handle.
    #[must_use]
    pub fn of(handle: &str) -> Self {
        if handle.starts_with("mxc://") {
            Self::Mxc
        } else if handle.starts_with("localmxc://") {
            Self::LocalMxc
        } else if handle.starts_with("file://") {
            Self::File
        } else if handle.starts_with("http") {
            Self::Http
        } else if handle.starts_with('/') {
            Self::AbsolutePath
        } else {
            Self::Relative
        }
    }

    /// Whether the handle goes through the assets endpoint.
    #[must_use]
    pub const fn is_asset(self) -> bool {
        matches!(self, Self::Mxc | Self::LocalMxc)
    }

    /// Whether the media browser can show and import handles of this scheme.
    #[must_use]
    pub const fn is_browsable(self) -> bool {
        matches!(self, Self::Mxc | Self::LocalMxc | Self::File)
    }
}

/// Downloaded media bytes with their content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    /// Raw media bytes.
    pub bytes: Bytes,
    /// Content type reported by the source.
    pub content_type: String,
}

impl MediaBlob {
    /// Creates a blob.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Content type without parameters (`image/png; q=1` → `image/png`).
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.content_type
            .split(';')
            .next()
            .map_or("", str::trim)
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
