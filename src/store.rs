//! The external media store: where attachment metadata comes from.
//!
//! The [`MediaStore`] trait is the seam between the srcset core and whatever
//! persists uploads and their renditions. The core only ever reads through it.
//!
//! [`Library`] is the store used by the command line: a JSON document listing
//! every attachment's metadata under a common uploads base URL.
//!
//! ```json
//! {
//!   "base_url": "http://example.org/wp-content/uploads",
//!   "attachments": {
//!     "42": {
//!       "width": 1600, "height": 1200, "file": "2015/06/test-large.png",
//!       "sizes": {
//!         "medium": { "width": 300, "height": 225, "file": "test-large-300x225.png" }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::types::{AttachmentId, AttachmentMetadata, ImageSrc, basename};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only access to uploaded images and their renditions.
///
/// Every lookup answers `None` for anything it cannot resolve; callers treat
/// that as "no srcset", never as a failure.
pub trait MediaStore: Sync {
    /// Full metadata record for an attachment.
    fn attachment_metadata(&self, id: AttachmentId) -> Option<AttachmentMetadata>;

    /// URL and dimensions of one named size of an attachment.
    fn attachment_image_src(&self, id: AttachmentId, size: &str) -> Option<ImageSrc>;

    /// Attachment owning a rendition with the given filename.
    fn find_attachment_by_filename(
        &self,
        filename: &str,
    ) -> Option<(AttachmentId, AttachmentMetadata)>;

    /// URL prefix under which all uploads are served.
    fn uploads_base_url(&self) -> &str;
}

/// JSON-backed media library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Library {
    /// Uploads base URL, with or without a trailing slash.
    pub base_url: String,
    #[serde(default)]
    pub attachments: BTreeMap<AttachmentId, AttachmentMetadata>,
}

impl Library {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            attachments: BTreeMap::new(),
        }
    }

    /// Load a library from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_attachment(mut self, id: AttachmentId, meta: AttachmentMetadata) -> Self {
        self.attachments.insert(id, meta);
        self
    }

    fn upload_url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), relative)
    }
}

/// Directory part of an upload-relative path, including the trailing `/`.
fn upload_dir(file: &str) -> &str {
    match file.rfind('/') {
        Some(pos) => &file[..=pos],
        None => "",
    }
}

impl MediaStore for Library {
    fn attachment_metadata(&self, id: AttachmentId) -> Option<AttachmentMetadata> {
        self.attachments.get(&id).cloned()
    }

    /// Named sizes resolve next to the original, the same way the catalog
    /// reads them, so a recorded `full` size wins over the top-level fields.
    /// Any size name the attachment never had resolves to the original upload.
    fn attachment_image_src(&self, id: AttachmentId, size: &str) -> Option<ImageSrc> {
        let meta = self.attachments.get(&id)?;
        let file = meta.file.as_deref()?;

        if let Some(rendition) = meta.sizes.get(size) {
            let relative = format!("{}{}", upload_dir(file), rendition.basename());
            return Some(ImageSrc::new(
                self.upload_url(&relative),
                rendition.width,
                rendition.height,
            ));
        }

        Some(ImageSrc::new(
            self.upload_url(file),
            meta.width?,
            meta.height?,
        ))
    }

    /// Exact basename match against every rendition, lowest id first.
    fn find_attachment_by_filename(
        &self,
        filename: &str,
    ) -> Option<(AttachmentId, AttachmentMetadata)> {
        let filename = basename(filename);
        self.attachments
            .iter()
            .find(|(_, meta)| meta.size_for_filename(filename).is_some())
            .map(|(id, meta)| (*id, meta.clone()))
    }

    fn uploads_base_url(&self) -> &str {
        &self.base_url
    }
}
