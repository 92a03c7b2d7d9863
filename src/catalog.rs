//! Rendition catalogs: every known encoding of one attachment, by size name.
//!
//! A catalog is built from the media store's metadata record. The original
//! upload is folded in under the `full` size name so the selector can treat
//! it like any other rendition.

use crate::store::MediaStore;
use crate::types::{AttachmentId, AttachmentMetadata, FULL_SIZE, Rendition, basename};
use indexmap::IndexMap;
use tracing::debug;

/// Renditions of one attachment keyed by size name, in catalog order.
///
/// Always contains a `full` entry. Filenames are stored as basenames.
#[derive(Debug, Clone, PartialEq)]
pub struct RenditionCatalog {
    entries: IndexMap<String, Rendition>,
}

impl RenditionCatalog {
    /// Normalize a metadata record into a catalog.
    ///
    /// Returns `None` when the record lacks the original's width, height or
    /// file. A `full` entry already present among the named sizes is kept as
    /// is; otherwise one is appended from the top-level fields.
    pub fn from_metadata(meta: &AttachmentMetadata) -> Option<Self> {
        let (Some(width), Some(height), Some(file)) = (meta.width, meta.height, &meta.file)
        else {
            return None;
        };

        let mut entries: IndexMap<String, Rendition> = meta
            .sizes
            .iter()
            .map(|(name, r)| {
                (
                    name.clone(),
                    Rendition::new(r.width, r.height, r.basename()),
                )
            })
            .collect();

        if !entries.contains_key(FULL_SIZE) {
            entries.insert(
                FULL_SIZE.to_string(),
                Rendition::new(width, height, basename(file)),
            );
        }

        Some(Self { entries })
    }

    pub fn get(&self, size: &str) -> Option<&Rendition> {
        self.entries.get(size)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rendition)> {
        self.entries.iter().map(|(name, r)| (name.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch and normalize the catalog for an attachment.
pub fn get_catalog(store: &impl MediaStore, id: AttachmentId) -> Option<RenditionCatalog> {
    let Some(meta) = store.attachment_metadata(id) else {
        debug!(id, "no metadata for attachment");
        return None;
    };
    let catalog = RenditionCatalog::from_metadata(&meta);
    if catalog.is_none() {
        debug!(id, "attachment metadata is missing width, height or file");
    }
    catalog
}
