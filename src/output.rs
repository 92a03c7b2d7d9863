//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.
//!
//! ## Rewrite
//!
//! ```text
//! 001 posts/hello.html (2 rewritten, 1 skipped)
//!     written
//! 002 posts/about.html (0 rewritten)
//! 003 posts/gone.html
//!     Error: IO error: No such file or directory (os error 2)
//!
//! 3 documents, 2 tags rewritten, 1 skipped, 0 failed
//! ```
//!
//! ## Srcset
//!
//! ```text
//! 42 medium
//!     srcset="… 300w, … 1024w, … 1600w"
//!     sizes="(max-width: 300px) 100vw, 300px"
//! ```

use crate::batch::{DocumentOutcome, total_report};
use crate::rewrite::RewriteReport;
use crate::types::AttachmentId;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `2 rewritten, 1 skipped`, leaving out zero skip/fail counts.
fn report_counts(report: &RewriteReport) -> String {
    let mut parts = vec![format!("{} rewritten", report.rewritten)];
    if report.skipped > 0 {
        parts.push(format!("{} skipped", report.skipped));
    }
    if report.failed > 0 {
        parts.push(format!("{} failed", report.failed));
    }
    parts.join(", ")
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format the outcome of a batch rewrite.
pub fn format_rewrite_output(outcomes: &[DocumentOutcome], dry_run: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, outcome) in outcomes.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), outcome.path.display());
        match &outcome.result {
            Ok(report) => {
                lines.push(format!("{header} ({})", report_counts(report)));
                if outcome.written {
                    lines.push(format!("{}written", indent(1)));
                } else if dry_run && report.rewritten > 0 {
                    lines.push(format!("{}would write", indent(1)));
                }
            }
            Err(err) => {
                lines.push(header);
                lines.push(format!("{}Error: {}", indent(1), err));
            }
        }
    }

    let total = total_report(outcomes);
    lines.push(String::new());
    lines.push(format!(
        "{}, {}, {} skipped, {} failed{}",
        plural(outcomes.len(), "document", "documents"),
        plural(total.rewritten, "tag rewritten", "tags rewritten"),
        total.skipped,
        total.failed,
        if dry_run { " (dry run)" } else { "" }
    ));
    lines
}

pub fn print_rewrite_output(outcomes: &[DocumentOutcome], dry_run: bool) {
    for line in format_rewrite_output(outcomes, dry_run) {
        println!("{}", line);
    }
}

/// Format the attributes computed for one attachment size.
pub fn format_srcset_output(
    id: AttachmentId,
    size: &str,
    srcset: Option<&str>,
    sizes: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![format!("{id} {size}")];
    match srcset {
        Some(srcset) => {
            lines.push(format!("{}{}", indent(1), srcset));
            if let Some(sizes) = sizes {
                lines.push(format!("{}{}", indent(1), sizes));
            }
        }
        None => lines.push(format!("{}no srcset", indent(1))),
    }
    lines
}

pub fn print_srcset_output(id: AttachmentId, size: &str, srcset: Option<&str>, sizes: Option<&str>) {
    for line in format_srcset_output(id, size, srcset, sizes) {
        println!("{}", line);
    }
}
