//! Shared data model: renditions, attachment metadata, and resolved image sources.
//!
//! These types cross the boundary between the external media store and the
//! srcset core, and are serialized as JSON in a [`Library`](crate::store::Library)
//! file. Size maps are [`IndexMap`]s because catalog order decides which
//! rendition wins when two share a width.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Numeric identifier of an uploaded image (an "attachment").
pub type AttachmentId = u64;

/// Size name of the original upload, injected into every catalog.
pub const FULL_SIZE: &str = "full";

/// One concrete encoded version of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub width: u32,
    pub height: u32,
    /// Filename relative to the upload directory, or a full path.
    pub file: String,
}

impl Rendition {
    pub fn new(width: u32, height: u32, file: impl Into<String>) -> Self {
        Self {
            width,
            height,
            file: file.into(),
        }
    }

    /// `height / width`, or `None` for a zero-width rendition.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.width != 0).then(|| self.height as f64 / self.width as f64)
    }

    /// Filename without any directory component.
    pub fn basename(&self) -> &str {
        basename(&self.file)
    }
}

/// Metadata record the media store keeps for one attachment.
///
/// Top-level fields describe the original upload. They are optional so that
/// a malformed record can be told apart from a well-formed one; the catalog
/// accessor rejects records missing any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttachmentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Path of the original relative to the uploads root, e.g. `2015/06/photo.png`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Intermediate renditions by size name, in generation order.
    pub sizes: IndexMap<String, Rendition>,
}

impl AttachmentMetadata {
    /// Resolve the size name whose file has the given basename.
    ///
    /// The original upload answers to [`FULL_SIZE`]; otherwise the first named
    /// size with a matching file wins.
    pub fn size_for_filename(&self, filename: &str) -> Option<&str> {
        if self.file.as_deref().map(basename) == Some(filename) {
            return Some(FULL_SIZE);
        }
        self.sizes
            .iter()
            .find(|(_, r)| r.basename() == filename)
            .map(|(name, _)| name.as_str())
    }
}

/// A resolved URL for one size of an attachment, as the media store reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSrc {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ImageSrc {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    /// Everything up to and including the last `/` of the URL.
    ///
    /// Sibling renditions live in the same directory, so this prefix plus a
    /// rendition's filename is that rendition's URL.
    pub fn base_url(&self) -> &str {
        match self.url.rfind('/') {
            Some(pos) => &self.url[..=pos],
            None => "",
        }
    }
}

/// Last path segment of a `/`-separated path or URL.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
