//! `srcset` and `sizes` attribute values.
//!
//! ## srcset
//!
//! One width descriptor per candidate, joined with `", "`:
//!
//! ```text
//! http://example.org/up/x-300x225.png 300w, http://example.org/up/x.png 1600w
//! ```
//!
//! ## sizes
//!
//! Built from an ordered list of [`SizeRule`]s. Order matters: the browser
//! uses the first rule whose media condition matches. A rule renders as
//! `(<condition>: <length>) <value>` when it has both a media condition and a
//! media length, and as the bare value otherwise:
//!
//! ```text
//! (max-width: 300px) 100vw, 300px
//! ```
//!
//! Every builder answers `None` where there is nothing worth emitting. The
//! `*_attribute` wrappers add the attribute name and escape the value.

use crate::select::Candidate;
use html_escape::encode_double_quoted_attribute;
use serde::{Deserialize, Serialize};

/// Slot width used when a rule leaves its value empty.
pub const DEFAULT_SIZE_VALUE: &str = "100vw";

/// Width descriptor for one candidate: `<base_url><file> <width>w`.
pub fn srcset_descriptor(base_url: &str, candidate: &Candidate) -> String {
    format!(
        "{}{} {}w",
        base_url, candidate.rendition.file, candidate.rendition.width
    )
}

/// Descriptors for every candidate, in the order given.
///
/// `None` for fewer than two candidates.
pub fn build_srcset_array(candidates: &[Candidate], base_url: &str) -> Option<Vec<String>> {
    if candidates.len() < 2 {
        return None;
    }
    Some(
        candidates
            .iter()
            .map(|c| srcset_descriptor(base_url, c))
            .collect(),
    )
}

/// Join descriptors into a `srcset` value. `None` when there are none.
pub fn join_descriptors(descriptors: &[String]) -> Option<String> {
    (!descriptors.is_empty()).then(|| descriptors.join(", "))
}

/// Complete `srcset` value for the candidates.
pub fn build_srcset(candidates: &[Candidate], base_url: &str) -> Option<String> {
    build_srcset_array(candidates, base_url).and_then(|d| join_descriptors(&d))
}

/// One entry of a `sizes` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeRule {
    /// Slot width, e.g. `100vw` or `300px`. Empty means [`DEFAULT_SIZE_VALUE`].
    #[serde(default)]
    pub value: String,
    /// Media feature, e.g. `max-width`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_condition: Option<String>,
    /// Media feature value, e.g. `480px`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_length: Option<String>,
}

impl SizeRule {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            media_condition: None,
            media_length: None,
        }
    }

    /// Attach a media query, e.g. `.when("max-width", "480px")`.
    pub fn when(mut self, condition: impl Into<String>, length: impl Into<String>) -> Self {
        self.media_condition = Some(condition.into());
        self.media_length = Some(length.into());
        self
    }

    pub fn render(&self) -> String {
        let value = if self.value.is_empty() {
            DEFAULT_SIZE_VALUE
        } else {
            &self.value
        };
        match (&self.media_condition, &self.media_length) {
            (Some(condition), Some(length)) => format!("({condition}: {length}) {value}"),
            _ => value.to_string(),
        }
    }
}

/// Full width up to the image's own width, the image's width beyond it.
pub fn default_size_rules(width: u32) -> Vec<SizeRule> {
    let px = format!("{width}px");
    vec![
        SizeRule::new(DEFAULT_SIZE_VALUE).when("max-width", px.clone()),
        SizeRule::new(px),
    ]
}

/// `sizes` value for an ordered rule list. `None` for an empty list.
pub fn build_sizes(rules: &[SizeRule]) -> Option<String> {
    if rules.is_empty() {
        return None;
    }
    Some(
        rules
            .iter()
            .map(SizeRule::render)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// How a caller describes the `sizes` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizesSpec {
    /// Used verbatim.
    Raw(String),
    /// Rendered with [`build_sizes`].
    Rules(Vec<SizeRule>),
}

impl SizesSpec {
    pub fn render(&self) -> Option<String> {
        match self {
            SizesSpec::Raw(raw) => {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| raw.to_string())
            }
            SizesSpec::Rules(rules) => build_sizes(rules),
        }
    }
}

impl From<Vec<SizeRule>> for SizesSpec {
    fn from(rules: Vec<SizeRule>) -> Self {
        SizesSpec::Rules(rules)
    }
}

/// `srcset="<value>"`
pub fn srcset_attribute(value: &str) -> String {
    format!(r#"srcset="{}""#, encode_double_quoted_attribute(value))
}

/// `sizes="<value>"`
pub fn sizes_attribute(value: &str) -> String {
    format!(r#"sizes="{}""#, encode_double_quoted_attribute(value))
}
