//! Shared test fixtures.
//!
//! One attachment, modeled on a 1600×1200 PNG uploaded in June 2015 with the
//! three usual intermediate sizes:
//!
//! | size | dimensions | ratio |
//! |------|------------|-------|
//! | thumbnail | 150×150 | 1.0 (hard crop) |
//! | medium | 300×225 | 0.75 |
//! | large | 1024×768 | 0.75 |
//! | full | 1600×1200 | 0.75 |
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let library = fixture_library();
//! let src = library.attachment_image_src(TEST_ID, "medium").unwrap();
//! ```

use crate::catalog::RenditionCatalog;
use crate::store::Library;
use crate::types::{AttachmentId, AttachmentMetadata, Rendition};

pub const UPLOADS: &str = "http://example.org/wp-content/uploads";

pub const TEST_ID: AttachmentId = 42;

/// Metadata record for the fixture attachment.
pub fn fixture_metadata() -> AttachmentMetadata {
    let mut meta = AttachmentMetadata {
        width: Some(1600),
        height: Some(1200),
        file: Some("2015/06/test-large.png".to_string()),
        ..Default::default()
    };
    for (name, w, h) in [("thumbnail", 150, 150), ("medium", 300, 225), ("large", 1024, 768)] {
        meta.sizes.insert(
            name.to_string(),
            Rendition::new(w, h, format!("test-large-{w}x{h}.png")),
        );
    }
    meta
}

/// A library holding only the fixture attachment.
pub fn fixture_library() -> Library {
    Library::new(UPLOADS).with_attachment(TEST_ID, fixture_metadata())
}

/// The fixture attachment's normalized catalog. Panics if it cannot be built.
pub fn fixture_catalog() -> RenditionCatalog {
    RenditionCatalog::from_metadata(&fixture_metadata())
        .unwrap_or_else(|| panic!("fixture metadata must produce a catalog"))
}
