//! The public face of the crate: srcset and sizes for an attachment, and
//! whole-document rewriting.
//!
//! [`Responsive`] ties a [`MediaStore`] to the selection and sizes settings
//! and runs catalog → selection → descriptors for each request. Nothing is
//! cached between calls; every call reads the store afresh.
//!
//! Callers that need to adjust results compose that explicitly:
//!
//! ```
//! use respimg::responsive::Responsive;
//! use respimg::store::Library;
//!
//! let responsive = Responsive::new(Library::new("http://example.org/uploads"))
//!     .with_srcset_filter(|descriptors, _id, _size| {
//!         descriptors
//!             .into_iter()
//!             .filter(|d| !d.ends_with(" 150w"))
//!             .collect()
//!     });
//! assert_eq!(responsive.get_srcset(1, "medium"), Ok(None));
//! ```
//!
//! ## Results
//!
//! `Ok(None)` means "no srcset here": the attachment or size is unknown, or
//! fewer than two renditions qualify. `Err` is reserved for a store that
//! reports a zero-width image.

use crate::catalog::get_catalog;
use crate::config::ResponsiveConfig;
use crate::descriptor::{
    SizesSpec, build_srcset_array, default_size_rules, join_descriptors, sizes_attribute,
    srcset_attribute,
};
use crate::rewrite::{Rewrite, rewrite_content};
use crate::select::{SelectError, SelectionFilter, select_candidates};
use crate::store::MediaStore;
use crate::types::AttachmentId;
use indexmap::IndexMap;
use tracing::debug;

/// Attributes of an image being rendered, in output order.
pub type ImageAttributes = IndexMap<String, String>;

/// Post-processor for the srcset descriptors of one image.
pub type SrcsetFilter = Box<dyn Fn(Vec<String>, AttachmentId, &str) -> Vec<String> + Send + Sync>;

/// Post-processor for the sizes description of one image.
pub type SizesFilter = Box<dyn Fn(SizesSpec, AttachmentId, &str) -> SizesSpec + Send + Sync>;

pub struct Responsive<S> {
    store: S,
    selection: SelectionFilter,
    sizes: Option<SizesSpec>,
    default_size: String,
    srcset_filter: Option<SrcsetFilter>,
    sizes_filter: Option<SizesFilter>,
}

impl<S: MediaStore> Responsive<S> {
    /// A srcset source with stock settings.
    pub fn new(store: S) -> Self {
        Self::from_config(store, &ResponsiveConfig::default())
    }

    pub fn from_config(store: S, config: &ResponsiveConfig) -> Self {
        Self {
            store,
            selection: config.selection.clone(),
            sizes: config.sizes.clone(),
            default_size: config.default_size.clone(),
            srcset_filter: None,
            sizes_filter: None,
        }
    }

    pub fn with_selection(mut self, selection: SelectionFilter) -> Self {
        self.selection = selection;
        self
    }

    /// Use `sizes` for every image instead of deriving it from image width.
    pub fn with_sizes(mut self, sizes: impl Into<SizesSpec>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn with_srcset_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Vec<String>, AttachmentId, &str) -> Vec<String> + Send + Sync + 'static,
    {
        self.srcset_filter = Some(Box::new(filter));
        self
    }

    pub fn with_sizes_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(SizesSpec, AttachmentId, &str) -> SizesSpec + Send + Sync + 'static,
    {
        self.sizes_filter = Some(Box::new(filter));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn default_size(&self) -> &str {
        &self.default_size
    }

    /// Descriptors (`"<url> <width>w"`) sorted by ascending width.
    pub fn get_srcset_array(
        &self,
        id: AttachmentId,
        size: &str,
    ) -> Result<Option<Vec<String>>, SelectError> {
        let Some(requested) = self.store.attachment_image_src(id, size) else {
            debug!(id, size, "no image for attachment size");
            return Ok(None);
        };
        let Some(catalog) = get_catalog(&self.store, id) else {
            return Ok(None);
        };
        let Some(candidates) = select_candidates(&catalog, &requested, &self.selection)? else {
            return Ok(None);
        };
        let Some(descriptors) = build_srcset_array(&candidates, requested.base_url()) else {
            return Ok(None);
        };

        let descriptors = match &self.srcset_filter {
            Some(filter) => filter(descriptors, id, size),
            None => descriptors,
        };
        Ok((!descriptors.is_empty()).then_some(descriptors))
    }

    /// The `srcset` value.
    pub fn get_srcset(&self, id: AttachmentId, size: &str) -> Result<Option<String>, SelectError> {
        Ok(self
            .get_srcset_array(id, size)?
            .and_then(|d| join_descriptors(&d)))
    }

    /// `srcset="<value>"`
    pub fn get_srcset_string(
        &self,
        id: AttachmentId,
        size: &str,
    ) -> Result<Option<String>, SelectError> {
        Ok(self.get_srcset(id, size)?.map(|v| srcset_attribute(&v)))
    }

    /// The `sizes` value.
    ///
    /// `rules` wins over the configured sizes, which win over the default
    /// derived from the image's width. `None` if the image is unknown or the
    /// rules render to nothing.
    pub fn get_sizes(
        &self,
        id: AttachmentId,
        size: &str,
        rules: Option<&SizesSpec>,
    ) -> Option<String> {
        let Some(image) = self.store.attachment_image_src(id, size) else {
            debug!(id, size, "no image for attachment size");
            return None;
        };
        let spec = rules
            .or(self.sizes.as_ref())
            .cloned()
            .unwrap_or_else(|| SizesSpec::Rules(default_size_rules(image.width)));
        let spec = match &self.sizes_filter {
            Some(filter) => filter(spec, id, size),
            None => spec,
        };
        spec.render()
    }

    /// `sizes="<value>"`
    pub fn get_sizes_string(
        &self,
        id: AttachmentId,
        size: &str,
        rules: Option<&SizesSpec>,
    ) -> Option<String> {
        self.get_sizes(id, size, rules).map(|v| sizes_attribute(&v))
    }

    /// Add `srcset` and `sizes` to every eligible image in an HTML document.
    pub fn filter_content_images(&self, html: &str) -> Rewrite {
        rewrite_content(html, self.store.uploads_base_url(), &self.store, |id, size| {
            let Some(srcset) = self.get_srcset(id, size)? else {
                return Ok(None);
            };
            let mut attributes = vec![srcset_attribute(&srcset)];
            if let Some(sizes) = self.get_sizes(id, size, None) {
                attributes.push(sizes_attribute(&sizes));
            }
            Ok(Some(attributes))
        })
    }

    /// Add `srcset` (and `sizes`, if absent) to attributes being rendered.
    ///
    /// Attributes that already carry a `srcset` are returned untouched.
    pub fn decorate_attributes(
        &self,
        id: AttachmentId,
        size: &str,
        mut attributes: ImageAttributes,
    ) -> Result<ImageAttributes, SelectError> {
        if attributes.contains_key("srcset") {
            return Ok(attributes);
        }
        let Some(srcset) = self.get_srcset(id, size)? else {
            return Ok(attributes);
        };
        attributes.insert("srcset".to_string(), srcset);
        if !attributes.contains_key("sizes") {
            if let Some(sizes) = self.get_sizes(id, size, None) {
                attributes.insert("sizes".to_string(), sizes);
            }
        }
        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SizeRule;
    use crate::store::Library;
    use crate::test_helpers::*;
    use crate::types::{AttachmentMetadata, Rendition};

    fn responsive() -> Responsive<Library> {
        Responsive::new(fixture_library())
    }

    fn url(file: &str) -> String {
        format!("{UPLOADS}/2015/06/{file}")
    }

    // =========================================================================
    // srcset
    // =========================================================================

    #[test]
    fn srcset_array_for_medium() {
        let array = responsive().get_srcset_array(TEST_ID, "medium").unwrap();
        assert_eq!(
            array,
            Some(vec![
                format!("{} 300w", url("test-large-300x225.png")),
                format!("{} 1024w", url("test-large-1024x768.png")),
                format!("{} 1600w", url("test-large.png")),
            ])
        );
    }

    #[test]
    fn srcset_array_for_thumbnail_is_none() {
        assert_eq!(responsive().get_srcset_array(TEST_ID, "thumbnail"), Ok(None));
    }

    #[test]
    fn srcset_array_for_unknown_attachment_is_none() {
        assert_eq!(responsive().get_srcset_array(99999, "nonexistent"), Ok(None));
    }

    #[test]
    fn srcset_string_for_unknown_size_uses_original() {
        let srcset = responsive().get_srcset_string(TEST_ID, "full-size").unwrap();
        assert_eq!(
            srcset,
            Some(format!(
                r#"srcset="{} 300w, {} 1024w, {} 1600w""#,
                url("test-large-300x225.png"),
                url("test-large-1024x768.png"),
                url("test-large.png"),
            ))
        );
    }

    #[test]
    fn srcset_respects_selection() {
        let responsive =
            responsive().with_selection(SelectionFilter::default().excluding(["large"]));
        let srcset = responsive.get_srcset(TEST_ID, "medium").unwrap().unwrap();
        assert_eq!(
            srcset,
            format!(
                "{} 300w, {} 1600w",
                url("test-large-300x225.png"),
                url("test-large.png")
            )
        );
    }

    #[test]
    fn srcset_filter_post_processes() {
        let responsive = responsive().with_srcset_filter(|mut d, id, size| {
            assert_eq!((id, size), (TEST_ID, "medium"));
            d.retain(|entry| !entry.ends_with(" 1600w"));
            d
        });
        let array = responsive.get_srcset_array(TEST_ID, "medium").unwrap().unwrap();
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn srcset_filter_emptying_result_is_none() {
        let responsive = responsive().with_srcset_filter(|_, _, _| Vec::new());
        assert_eq!(responsive.get_srcset(TEST_ID, "medium"), Ok(None));
    }

    #[test]
    fn zero_width_size_is_an_error() {
        let mut meta = fixture_metadata();
        meta.sizes
            .insert("broken".into(), Rendition::new(0, 100, "test-large-0x100.png"));
        let responsive = Responsive::new(fixture_library().with_attachment(TEST_ID, meta));
        assert!(matches!(
            responsive.get_srcset_array(TEST_ID, "broken"),
            Err(SelectError::ZeroWidth { .. })
        ));
    }

    #[test]
    fn malformed_metadata_is_none() {
        let library = fixture_library().with_attachment(
            5,
            AttachmentMetadata {
                file: Some("2015/06/a.png".into()),
                width: Some(100),
                ..Default::default()
            },
        );
        assert_eq!(Responsive::new(library).get_srcset(5, "full"), Ok(None));
    }

    // =========================================================================
    // sizes
    // =========================================================================

    #[test]
    fn default_sizes_use_requested_width() {
        assert_eq!(
            responsive().get_sizes(TEST_ID, "medium", None).as_deref(),
            Some("(max-width: 300px) 100vw, 300px")
        );
        assert_eq!(
            responsive().get_sizes_string(TEST_ID, "large", None).as_deref(),
            Some(r#"sizes="(max-width: 1024px) 100vw, 1024px""#)
        );
    }

    #[test]
    fn explicit_rules_win() {
        let rules = SizesSpec::Rules(vec![
            SizeRule::new("50vw").when("min-width", "800px"),
            SizeRule::new("100vw"),
        ]);
        let responsive = responsive().with_sizes(SizesSpec::Raw("33vw".into()));
        assert_eq!(
            responsive.get_sizes(TEST_ID, "medium", Some(&rules)).as_deref(),
            Some("(min-width: 800px) 50vw, 100vw")
        );
        assert_eq!(
            responsive.get_sizes(TEST_ID, "medium", None).as_deref(),
            Some("33vw")
        );
    }

    #[test]
    fn sizes_filter_sees_effective_spec() {
        let responsive = responsive().with_sizes_filter(|spec, _, size| {
            assert_eq!(size, "medium");
            match spec {
                SizesSpec::Rules(mut rules) => {
                    rules.truncate(1);
                    SizesSpec::Rules(rules)
                }
                raw => raw,
            }
        });
        assert_eq!(
            responsive.get_sizes(TEST_ID, "medium", None).as_deref(),
            Some("(max-width: 300px) 100vw")
        );
    }

    #[test]
    fn sizes_for_unknown_attachment_is_none() {
        assert_eq!(responsive().get_sizes_string(99999, "medium", None), None);
    }

    // =========================================================================
    // Attribute decoration
    // =========================================================================

    #[test]
    fn decorate_adds_srcset_and_sizes() {
        let mut attrs = ImageAttributes::new();
        attrs.insert("src".into(), url("test-large-300x225.png"));
        attrs.insert("alt".into(), "A test".into());

        let attrs = responsive().decorate_attributes(TEST_ID, "medium", attrs).unwrap();
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["src", "alt", "srcset", "sizes"]);
        assert_eq!(attrs["sizes"], "(max-width: 300px) 100vw, 300px");
    }

    #[test]
    fn decorate_keeps_existing_sizes() {
        let mut attrs = ImageAttributes::new();
        attrs.insert("sizes".into(), "50vw".into());
        let attrs = responsive().decorate_attributes(TEST_ID, "medium", attrs).unwrap();
        assert_eq!(attrs["sizes"], "50vw");
        assert!(attrs.contains_key("srcset"));
    }

    #[test]
    fn decorate_is_noop_with_existing_srcset() {
        let mut attrs = ImageAttributes::new();
        attrs.insert("srcset".into(), "custom 1w".into());
        let out = responsive()
            .decorate_attributes(TEST_ID, "medium", attrs.clone())
            .unwrap();
        assert_eq!(out, attrs);
    }

    #[test]
    fn decorate_without_srcset_leaves_attributes() {
        let attrs = ImageAttributes::new();
        let out = responsive()
            .decorate_attributes(TEST_ID, "thumbnail", attrs.clone())
            .unwrap();
        assert_eq!(out, attrs);
    }

    // =========================================================================
    // Content rewriting
    // =========================================================================

    #[test]
    fn content_with_class_hints() {
        let html = format!(
            r#"<p><img class="alignnone size-medium wp-image-{TEST_ID}" src="{}" alt="" width="300" height="225" /></p>"#,
            url("test-large-300x225.png")
        );
        let rewrite = responsive().filter_content_images(&html);
        assert_eq!(
            rewrite.html,
            format!(
                r#"<p><img class="alignnone size-medium wp-image-{TEST_ID}" src="{}" alt="" width="300" height="225" srcset="{} 300w, {} 1024w, {} 1600w" sizes="(max-width: 300px) 100vw, 300px" /></p>"#,
                url("test-large-300x225.png"),
                url("test-large-300x225.png"),
                url("test-large-1024x768.png"),
                url("test-large.png"),
            )
        );
        assert_eq!(rewrite.report.rewritten, 1);
    }

    #[test]
    fn content_with_thumbnail_is_unchanged() {
        let html = format!(r#"<img src="{}">"#, url("test-large-150x150.png"));
        let rewrite = responsive().filter_content_images(&html);
        assert_eq!(rewrite.html, html);
        assert_eq!(rewrite.report.skipped, 1);
    }
}
