//! Rewriting HTML files on disk.
//!
//! Paths given on the command line are either files, taken as they are, or
//! directories, searched recursively for `.html`/`.htm` files. Documents are
//! independent, so they are rewritten in parallel on the rayon pool.
//!
//! A file is written back only if at least one tag changed and this is not a
//! dry run. A failure on one file is recorded in its outcome and does not stop
//! the others. Directory entries that cannot be read while searching are
//! logged and skipped.

use crate::responsive::Responsive;
use crate::rewrite::RewriteReport;
use crate::store::MediaStore;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HTML_EXTENSIONS.iter().any(|h| e.eq_ignore_ascii_case(h)))
}

/// Expand the given paths into the list of documents to rewrite, sorted.
pub fn collect_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && is_html(entry.path()) {
                    documents.push(entry.into_path());
                }
            }
        } else {
            documents.push(path.clone());
        }
    }
    documents.sort();
    documents.dedup();
    documents
}

/// What happened to one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub result: Result<RewriteReport, BatchError>,
    /// Whether the file on disk was replaced.
    pub written: bool,
}

/// Rewrite one file. Returns the report and whether the file was written.
pub fn rewrite_document<S: MediaStore>(
    responsive: &Responsive<S>,
    path: &Path,
    dry_run: bool,
) -> Result<(RewriteReport, bool), BatchError> {
    let html = std::fs::read_to_string(path)?;
    let rewrite = responsive.filter_content_images(&html);
    let write = !dry_run && rewrite.report.rewritten > 0;
    if write {
        std::fs::write(path, &rewrite.html)?;
        info!(path = %path.display(), rewritten = rewrite.report.rewritten, "rewrote document");
    }
    Ok((rewrite.report, write))
}

/// Rewrite every document in parallel, returning outcomes in input order.
pub fn rewrite_documents<S: MediaStore>(
    responsive: &Responsive<S>,
    documents: &[PathBuf],
    dry_run: bool,
) -> Vec<DocumentOutcome> {
    documents
        .par_iter()
        .map(|path| match rewrite_document(responsive, path, dry_run) {
            Ok((report, written)) => DocumentOutcome {
                path: path.clone(),
                result: Ok(report),
                written,
            },
            Err(err) => DocumentOutcome {
                path: path.clone(),
                result: Err(err),
                written: false,
            },
        })
        .collect()
}

/// Sum of all successful reports.
pub fn total_report(outcomes: &[DocumentOutcome]) -> RewriteReport {
    let mut total = RewriteReport::default();
    for outcome in outcomes {
        if let Ok(report) = &outcome.result {
            total.absorb(*report);
        }
    }
    total
}
