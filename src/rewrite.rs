//! Adding `srcset`/`sizes` to `<img>` tags inside an HTML document.
//!
//! This is deliberately not an HTML parser. Tags are found with a pattern that
//! understands quoted attribute values and nothing else, and only the matched
//! tag text is ever replaced. Everything outside a rewritten tag, including
//! every tag that is left alone, comes out byte-for-byte as it went in.
//!
//! ## Which tags
//!
//! A tag is considered when its `src` lies under the uploads base URL and it
//! has no `srcset` yet.
//!
//! ## Which attachment
//!
//! 1. Class hints: `wp-image-<id>` names the attachment, `size-<name>` the size.
//! 2. With an id but no size hint, the `src` filename is matched against that
//!    attachment's renditions.
//! 3. Without an id, the media store is asked which attachment owns the `src`
//!    filename, and the size is found the same way.
//!
//! Tags that resolve to nothing are skipped silently.
//!
//! ## Splicing
//!
//! New attributes go right after the last existing attribute, before any
//! whitespace or self-closing slash:
//!
//! ```text
//! <img src="/up/x.png" class="a" />
//! <img src="/up/x.png" class="a" srcset="…" sizes="…" />
//! ```

use crate::select::SelectError;
use crate::store::MediaStore;
use crate::types::{AttachmentId, basename};
use html_escape::decode_html_entities;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, warn};

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b(?:\s*=\s*(?:"[^"]*"|'[^']*')|[^>])*>"#).expect("valid img tag regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`][^\s<>`]*)))?"#)
        .expect("valid attribute regex")
});

/// One attribute as written in the tag. `value` is still entity-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
}

impl Attribute<'_> {
    /// Value with HTML entities decoded.
    pub fn decoded_value(&self) -> Option<Cow<'_, str>> {
        self.value.map(|v| decode_html_entities(v))
    }
}

/// An `<img>` tag located in a document.
#[derive(Debug, Clone)]
pub struct ImageTag<'a> {
    raw: &'a str,
    attributes: Vec<Attribute<'a>>,
    /// Byte offset in `raw` just past the last attribute.
    attributes_end: usize,
}

impl<'a> ImageTag<'a> {
    /// Tokenize a complete `<img …>` tag. `None` if `raw` is not one.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let opener = raw.get(..4)?;
        if !opener.eq_ignore_ascii_case("<img") || !raw.ends_with('>') {
            return None;
        }
        let inner = &raw[4..raw.len() - 1];

        let mut attributes = Vec::new();
        let mut attributes_end = 4;
        for caps in ATTRIBUTE.captures_iter(inner) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str());
            attributes.push(Attribute {
                name: name.as_str(),
                value,
            });
            attributes_end = 4 + whole.end();
        }

        Some(Self {
            raw,
            attributes,
            attributes_end,
        })
    }

    pub fn attributes(&self) -> &[Attribute<'a>] {
        &self.attributes
    }

    /// First attribute with this name, compared case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn src(&self) -> Option<Cow<'_, str>> {
        self.attribute("src").and_then(Attribute::decoded_value)
    }

    /// Attachment id and size name from `wp-image-<id>` / `size-<name>` classes.
    pub fn class_hints(&self) -> (Option<AttachmentId>, Option<String>) {
        let Some(classes) = self.attribute("class").and_then(Attribute::decoded_value) else {
            return (None, None);
        };
        let mut id = None;
        let mut size = None;
        for class in classes.split_whitespace() {
            if let Some(digits) = class.strip_prefix("wp-image-") {
                if id.is_none() {
                    id = digits.parse().ok();
                }
            } else if let Some(name) = class.strip_prefix("size-") {
                if size.is_none() && !name.is_empty() {
                    size = Some(name.to_string());
                }
            }
        }
        (id, size)
    }

    /// The tag with `extra` spliced in after the last existing attribute.
    pub fn with_attributes(&self, extra: &[String]) -> String {
        let (head, tail) = self.raw.split_at(self.attributes_end);
        let extra_len: usize = extra.iter().map(|e| e.len() + 1).sum();
        let mut out = String::with_capacity(self.raw.len() + extra_len);
        out.push_str(head);
        for attr in extra {
            out.push(' ');
            out.push_str(attr);
        }
        out.push_str(tail);
        out
    }
}

/// Filename a URL points at, without query string or fragment.
pub fn url_filename(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    basename(&url[..end])
}

fn is_under(src: &str, uploads_base_url: &str) -> bool {
    let base = uploads_base_url.trim_end_matches('/');
    src.strip_prefix(base).is_some_and(|rest| rest.starts_with('/'))
}

/// Work out which attachment and size an image tag shows.
pub fn resolve_identity(
    tag: &ImageTag<'_>,
    store: &impl MediaStore,
) -> Option<(AttachmentId, String)> {
    let (id, size) = tag.class_hints();
    if let (Some(id), Some(size)) = (id, size) {
        return Some((id, size));
    }

    let src = tag.src()?;
    let filename = url_filename(&src);
    if filename.is_empty() {
        return None;
    }

    let (id, meta) = match id {
        Some(id) => (id, store.attachment_metadata(id)?),
        None => store.find_attachment_by_filename(filename)?,
    };
    let size = meta.size_for_filename(filename)?;
    Some((id, size.to_string()))
}

/// Counts from one rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Tags that gained a `srcset`.
    pub rewritten: usize,
    /// Candidate tags left alone: unknown attachment or too few renditions.
    pub skipped: usize,
    /// Candidate tags left alone because the store's data is corrupt.
    pub failed: usize,
}

impl RewriteReport {
    pub fn candidates(&self) -> usize {
        self.rewritten + self.skipped + self.failed
    }

    pub fn absorb(&mut self, other: RewriteReport) {
        self.rewritten += other.rewritten;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub html: String,
    pub report: RewriteReport,
}

/// Rewrite every eligible `<img>` tag in `html`.
///
/// `attributes_for` produces the complete attributes (`srcset="…"`, then
/// optionally `sizes="…"`) for a resolved attachment and size, or `None` when
/// no srcset applies. An error for one tag is logged and that tag is left as
/// is; the rest of the document is still processed.
pub fn rewrite_content<F>(
    html: &str,
    uploads_base_url: &str,
    store: &impl MediaStore,
    mut attributes_for: F,
) -> Rewrite
where
    F: FnMut(AttachmentId, &str) -> Result<Option<Vec<String>>, SelectError>,
{
    let mut out = String::with_capacity(html.len());
    let mut report = RewriteReport::default();
    let mut last = 0;

    for m in IMG_TAG.find_iter(html) {
        let Some(tag) = ImageTag::parse(m.as_str()) else {
            continue;
        };
        if tag.has_attribute("srcset") {
            continue;
        }
        let Some(src) = tag.src() else {
            continue;
        };
        if !is_under(&src, uploads_base_url) {
            continue;
        }

        let Some((id, size)) = resolve_identity(&tag, store) else {
            debug!(src = %src, "could not identify attachment for image");
            report.skipped += 1;
            continue;
        };

        match attributes_for(id, &size) {
            Ok(Some(extra)) if !extra.is_empty() => {
                out.push_str(&html[last..m.start()]);
                out.push_str(&tag.with_attributes(&extra));
                last = m.end();
                report.rewritten += 1;
            }
            Ok(_) => {
                debug!(id, size = %size, "no srcset for image");
                report.skipped += 1;
            }
            Err(err) => {
                warn!(id, size = %size, error = %err, "leaving image unchanged");
                report.failed += 1;
            }
        }
    }

    out.push_str(&html[last..]);
    Rewrite { html: out, report }
}
