//! Candidate selection: which renditions may stand in for the requested one.
//!
//! A browser picks freely among srcset candidates, so every candidate must
//! show the same picture as the image the author placed. Selection keeps a
//! rendition only if all of these hold:
//!
//! 1. its size name survives the exclude list, then the include list;
//! 2. its aspect ratio is within [`ASPECT_RATIO_TOLERANCE`] of the requested
//!    image's (soft crops only; a hard-cropped thumbnail shows less picture);
//! 3. if the requested URL carries an edit hash (`-e` + 13 digits), its
//!    filename carries the same hash, so renditions left over from before an
//!    in-place edit are never mixed in.
//!
//! Survivors are keyed by width. Two renditions of equal width collapse to the
//! later one in catalog order, and the result comes back sorted by ascending
//! width. Fewer than two survivors means there is nothing to choose between,
//! and selection answers `None`.

use crate::catalog::RenditionCatalog;
use crate::types::{ImageSrc, Rendition};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, trace};

/// Largest aspect-ratio difference still considered the same picture.
///
/// Resizing rounds heights to whole pixels, so soft-cropped renditions drift
/// slightly from the original ratio.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.01;

static EDIT_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-e[0-9]{13})(?:[^0-9]|$)").expect("valid edit-hash regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// The store reported a zero-width image, so no ratio can be computed.
    /// This means the catalog is corrupt rather than sparse.
    #[error("requested image {url} has zero width")]
    ZeroWidth { url: String },
}

/// Which size names and renditions are eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionFilter {
    /// Drop renditions whose aspect ratio differs from the requested image.
    pub maintain_aspect_ratio: bool,
    /// Size names never used as candidates.
    pub excluded_sizes: BTreeSet<String>,
    /// When non-empty, only these size names are used.
    pub included_sizes: BTreeSet<String>,
    /// Edit hash every candidate must carry. When unset, it is taken from the
    /// requested image's URL.
    #[serde(skip)]
    pub edit_hash: Option<String>,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self {
            maintain_aspect_ratio: true,
            excluded_sizes: BTreeSet::new(),
            included_sizes: BTreeSet::new(),
            edit_hash: None,
        }
    }
}

impl SelectionFilter {
    pub fn excluding<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_sizes.extend(sizes.into_iter().map(Into::into));
        self
    }

    pub fn including<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included_sizes.extend(sizes.into_iter().map(Into::into));
        self
    }

    pub fn ignoring_aspect_ratio(mut self) -> Self {
        self.maintain_aspect_ratio = false;
        self
    }

    /// Exclude first, then restrict to the include list if it has entries.
    pub fn admits_size(&self, size: &str) -> bool {
        if self.excluded_sizes.contains(size) {
            return false;
        }
        self.included_sizes.is_empty() || self.included_sizes.contains(size)
    }
}

/// A rendition that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub size: String,
    pub rendition: Rendition,
}

/// The `-e<13 digits>` token an in-place edit leaves in filenames, if any.
pub fn edit_hash(url: &str) -> Option<&str> {
    EDIT_HASH
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether two ratios are close enough to be the same soft-cropped picture.
pub fn ratios_match(base: f64, candidate: f64) -> bool {
    (base - candidate).abs() < ASPECT_RATIO_TOLERANCE
}

/// Select the renditions usable as srcset candidates for `requested`.
///
/// Returns `Ok(None)` when fewer than two candidates survive, and
/// `Err(SelectError::ZeroWidth)` when `requested` has no width.
pub fn select_candidates(
    catalog: &RenditionCatalog,
    requested: &ImageSrc,
    filter: &SelectionFilter,
) -> Result<Option<Vec<Candidate>>, SelectError> {
    if requested.width == 0 {
        return Err(SelectError::ZeroWidth {
            url: requested.url.clone(),
        });
    }
    let base_ratio = requested.height as f64 / requested.width as f64;
    let hash = filter
        .edit_hash
        .as_deref()
        .or_else(|| edit_hash(&requested.url));

    let mut by_width: BTreeMap<u32, Candidate> = BTreeMap::new();

    for (size, rendition) in catalog.iter() {
        if !filter.admits_size(size) {
            trace!(size, "size filtered out by name");
            continue;
        }

        let Some(ratio) = rendition.aspect_ratio() else {
            debug!(size, file = %rendition.file, "skipping zero-width rendition");
            continue;
        };
        if filter.maintain_aspect_ratio && !ratios_match(base_ratio, ratio) {
            trace!(size, ratio, base_ratio, "aspect ratio differs");
            continue;
        }

        if hash.is_some_and(|h| !rendition.file.contains(h)) {
            trace!(size, hash, "rendition predates edit");
            continue;
        }

        by_width.insert(
            rendition.width,
            Candidate {
                size: size.to_string(),
                rendition: rendition.clone(),
            },
        );
    }

    if by_width.len() < 2 {
        debug!(
            url = %requested.url,
            candidates = by_width.len(),
            "not enough candidates for a srcset"
        );
        return Ok(None);
    }

    Ok(Some(by_width.into_values().collect()))
}
