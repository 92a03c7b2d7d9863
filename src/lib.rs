//! # respimg
//!
//! Responsive-image attributes for uploaded images. Given an image's known
//! renditions, respimg works out which of them a browser may swap in for the
//! one an author placed, and writes the `srcset` and `sizes` attributes that
//! say so, either as strings or spliced into existing HTML.
//!
//! # Architecture: One Request, Four Steps
//!
//! ```text
//! media store ──► catalog ──► select ──► descriptor ──► srcset / sizes
//!                                                         │
//! HTML ──────────────────────► rewrite ◄──────────────────┘──► HTML'
//! ```
//!
//! 1. **Catalog**: the store's metadata record becomes a [`RenditionCatalog`],
//!    with the original upload folded in as the `full` size.
//! 2. **Select**: renditions are filtered by size name, aspect ratio, and edit
//!    generation, then keyed by width.
//! 3. **Descriptor**: survivors become `"<url> <width>w"` descriptors; sizes
//!    rules become the `sizes` value.
//! 4. **Rewrite**: `<img>` tags in HTML are identified by class hints or
//!    filename and gain both attributes.
//!
//! Every step is a pure function of its inputs. The only I/O is reading the
//! [`MediaStore`], which the caller supplies.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Renditions, attachment metadata, resolved image sources |
//! | [`store`] | The [`MediaStore`] seam and the JSON-backed [`Library`](store::Library) |
//! | [`catalog`] | Metadata record → normalized rendition catalog |
//! | [`select`] | Candidate selection and the edit-hash guard |
//! | [`descriptor`] | `srcset` and `sizes` values and attributes |
//! | [`rewrite`] | Locating, identifying and rewriting `<img>` tags |
//! | [`responsive`] | [`Responsive`](responsive::Responsive), the public entry points |
//! | [`config`] | `respimg.toml` loading, merging, and validation |
//! | [`batch`] | Rewriting HTML files on disk, in parallel |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Only Soft Crops
//!
//! A browser treats every srcset candidate as the same picture at a different
//! resolution. A square thumbnail of a landscape photo is a different picture,
//! so by default a rendition must match the placed image's aspect ratio to
//! within 0.01 (resizing rounds heights, so exact equality would reject
//! legitimate renditions).
//!
//! ## Pattern Matching, Not Parsing
//!
//! Rewriting touches only `<img>` tags that point into the uploads directory
//! and leaves every other byte of the document alone. A tolerant tag pattern
//! does that; a DOM round-trip would normalize whitespace, quoting and entity
//! encoding across the whole document.
//!
//! ## Explicit Extension Points
//!
//! Adjusting the computed descriptors or sizes is done with closures handed to
//! [`Responsive`](responsive::Responsive) when it is built. There is no global
//! registry of hooks.
//!
//! [`RenditionCatalog`]: catalog::RenditionCatalog
//! [`MediaStore`]: store::MediaStore

pub mod batch;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod output;
pub mod responsive;
pub mod rewrite;
pub mod select;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
