//! End-to-end tests through the public API, against a media library loaded
//! from JSON the way the command line loads it.

use respimg::config::load_config;
use respimg::descriptor::{SizeRule, SizesSpec};
use respimg::responsive::{ImageAttributes, Responsive};
use respimg::select::SelectionFilter;
use respimg::store::Library;
use std::path::Path;
use tempfile::TempDir;

const UPLOADS: &str = "http://example.org/wp-content/uploads";

const LIBRARY_JSON: &str = r#"{
  "base_url": "http://example.org/wp-content/uploads",
  "attachments": {
    "42": {
      "width": 1600,
      "height": 1200,
      "file": "2015/06/test-large.png",
      "sizes": {
        "thumbnail": { "width": 150, "height": 150, "file": "test-large-150x150.png" },
        "medium": { "width": 300, "height": 225, "file": "test-large-300x225.png" },
        "large": { "width": 1024, "height": 768, "file": "test-large-1024x768.png" }
      }
    },
    "43": {
      "width": 2000,
      "height": 1000,
      "file": "2015/07/pano-e1434567890123.jpg",
      "sizes": {
        "medium": { "width": 300, "height": 150, "file": "pano-300x150.jpg" },
        "large": { "width": 1024, "height": 512, "file": "pano-e1434567890123-1024x512.jpg" }
      }
    }
  }
}"#;

fn load_library(dir: &Path) -> Library {
    let path = dir.join("library.json");
    std::fs::write(&path, LIBRARY_JSON).unwrap();
    Library::load(&path).unwrap()
}

fn responsive() -> (TempDir, Responsive<Library>) {
    let tmp = TempDir::new().unwrap();
    let library = load_library(tmp.path());
    (tmp, Responsive::new(library))
}

fn june(file: &str) -> String {
    format!("{UPLOADS}/2015/06/{file}")
}

fn widths(descriptors: &[String]) -> Vec<u32> {
    descriptors
        .iter()
        .map(|d| {
            let (_, w) = d.rsplit_once(' ').unwrap();
            w.trim_end_matches('w').parse().unwrap()
        })
        .collect()
}

#[test]
fn medium_srcset_matches_expected_descriptors() {
    let (_tmp, responsive) = responsive();
    let array = responsive.get_srcset_array(42, "medium").unwrap().unwrap();
    assert_eq!(
        array,
        vec![
            format!("{} 300w", june("test-large-300x225.png")),
            format!("{} 1024w", june("test-large-1024x768.png")),
            format!("{} 1600w", june("test-large.png")),
        ]
    );
}

#[test]
fn unknown_attachment_has_no_srcset() {
    let (_tmp, responsive) = responsive();
    assert_eq!(responsive.get_srcset_array(99999, "nonexistent"), Ok(None));
    assert_eq!(responsive.get_srcset_string(99999, "nonexistent"), Ok(None));
    assert_eq!(responsive.get_sizes_string(99999, "nonexistent", None), None);
}

#[test]
fn hard_cropped_thumbnail_has_no_srcset() {
    let (_tmp, responsive) = responsive();
    assert_eq!(responsive.get_srcset(42, "thumbnail"), Ok(None));
}

#[test]
fn srcset_string_for_unregistered_size_name() {
    let (_tmp, responsive) = responsive();
    let expected = format!(
        r#"srcset="{} 300w, {} 1024w, {} 1600w""#,
        june("test-large-300x225.png"),
        june("test-large-1024x768.png"),
        june("test-large.png"),
    );
    assert_eq!(
        responsive.get_srcset_string(42, "full-size"),
        Ok(Some(expected))
    );
}

#[test]
fn edited_image_ignores_pre_edit_renditions() {
    let (_tmp, responsive) = responsive();
    let array = responsive.get_srcset_array(43, "large").unwrap().unwrap();
    assert_eq!(
        array,
        vec![
            format!("{UPLOADS}/2015/07/pano-e1434567890123-1024x512.jpg 1024w"),
            format!("{UPLOADS}/2015/07/pano-e1434567890123.jpg 2000w"),
        ]
    );
}

#[test]
fn srcset_widths_are_ascending_and_unique() {
    let (_tmp, responsive) = responsive();
    let responsive = responsive.with_selection(SelectionFilter::default().ignoring_aspect_ratio());
    let array = responsive.get_srcset_array(42, "medium").unwrap().unwrap();
    let w = widths(&array);
    let mut sorted = w.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(w, sorted);
    assert_eq!(w, vec![150, 300, 1024, 1600]);
}

#[test]
fn included_sizes_restrict_to_named() {
    let (_tmp, responsive) = responsive();
    let responsive =
        responsive.with_selection(SelectionFilter::default().including(["medium", "full"]));
    let array = responsive.get_srcset_array(42, "medium").unwrap().unwrap();
    assert_eq!(widths(&array), vec![300, 1600]);
}

#[test]
fn custom_sizes_rules_keep_order() {
    let (_tmp, responsive) = responsive();
    let rules = SizesSpec::Rules(vec![
        SizeRule::new("100vw").when("max-width", "480px"),
        SizeRule::new("50vw").when("max-width", "1024px"),
        SizeRule::new("33vw"),
    ]);
    assert_eq!(
        responsive.get_sizes_string(42, "large", Some(&rules)),
        Some(r#"sizes="(max-width: 480px) 100vw, (max-width: 1024px) 50vw, 33vw""#.to_string())
    );
}

#[test]
fn content_rewrite_touches_only_known_image() {
    let (_tmp, responsive) = responsive();
    let known = format!(r#"<img src="{}" alt="Known">"#, june("test-large-1024x768.png"));
    let unknown = format!(r#"<img src="{}" alt="Unknown">"#, june("somebody-else.png"));
    let html = format!("<div>\n  {unknown}{known}\n</div>\n");

    let rewrite = responsive.filter_content_images(&html);

    let rewritten = format!(
        r#"<img src="{}" alt="Known" srcset="{} 300w, {} 1024w, {} 1600w" sizes="(max-width: 1024px) 100vw, 1024px">"#,
        june("test-large-1024x768.png"),
        june("test-large-300x225.png"),
        june("test-large-1024x768.png"),
        june("test-large.png"),
    );
    assert_eq!(rewrite.html, format!("<div>\n  {unknown}{rewritten}\n</div>\n"));
    assert_eq!(rewrite.report.rewritten, 1);
    assert_eq!(rewrite.report.skipped, 1);
}

#[test]
fn content_rewrite_ignores_foreign_images() {
    let (_tmp, responsive) = responsive();
    let html = r#"<p><img src="https://cdn.example.net/test-large.png"></p>"#;
    let rewrite = responsive.filter_content_images(html);
    assert_eq!(rewrite.html, html);
    assert_eq!(rewrite.report.candidates(), 0);
}

#[test]
fn decorate_attributes_for_rendered_thumbnail() {
    let (_tmp, responsive) = responsive();
    let mut attrs = ImageAttributes::new();
    attrs.insert("src".into(), june("test-large-1024x768.png"));
    attrs.insert("class".into(), "attachment-large".into());

    let attrs = responsive.decorate_attributes(42, "large", attrs).unwrap();
    assert_eq!(
        attrs.get("sizes").map(String::as_str),
        Some("(max-width: 1024px) 100vw, 1024px")
    );
    assert!(attrs["srcset"].ends_with("test-large.png 1600w"));
}

#[test]
fn config_file_drives_selection_and_sizes() {
    let tmp = TempDir::new().unwrap();
    let library = load_library(tmp.path());
    let config_path = tmp.path().join("respimg.toml");
    std::fs::write(
        &config_path,
        r#"
sizes = "(max-width: 600px) 100vw, 600px"

[selection]
excluded_sizes = ["large"]
"#,
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let responsive = Responsive::from_config(library, &config);

    let array = responsive.get_srcset_array(42, "medium").unwrap().unwrap();
    assert_eq!(widths(&array), vec![300, 1600]);
    assert_eq!(
        responsive.get_sizes(42, "medium", None).as_deref(),
        Some("(max-width: 600px) 100vw, 600px")
    );
}
