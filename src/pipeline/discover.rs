//! Artifact discovery: list the images a renderer run produced.
//!
//! Ghostscript expands the `%d` placeholder of the output pattern once per
//! rendered page. We do not know in advance how many pages that is, so the
//! placeholder becomes a numeric wildcard and the task's own subdirectory is
//! scanned for matches.

use crate::error::ConversionError;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder Ghostscript replaces with the page number.
pub const PAGE_PLACEHOLDER: &str = "%d";

/// Find `<stem>-<n>.<ext>` files in `dir`, ordered by page number.
pub async fn discover_outputs(
    dir: &Path,
    stem: &str,
    ext: &str,
) -> Result<Vec<PathBuf>, ConversionError> {
    let pattern = output_regex(stem, ext)?;

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| listing_error(dir, e))?;

    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| listing_error(dir, e))? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(caps) = pattern.captures(&name) {
            let page = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            found.push((page, entry.path()));
        }
    }

    found.sort();
    debug!("Discovered {} outputs in {}", found.len(), dir.display());
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// Regex matching the file names a `<stem>-%d.<ext>` pattern expands to.
pub fn output_regex(stem: &str, ext: &str) -> Result<Regex, ConversionError> {
    let (prefix, suffix) = format!("{stem}-{PAGE_PLACEHOLDER}.{ext}")
        .split_once(PAGE_PLACEHOLDER)
        .map(|(p, s)| (regex::escape(p), regex::escape(s)))
        .ok_or_else(|| ConversionError::Internal("output pattern lost its placeholder".into()))?;
    Regex::new(&format!("^{prefix}([0-9]+){suffix}$"))
        .map_err(|e| ConversionError::Internal(format!("output pattern regex: {e}")))
}

fn listing_error(dir: &Path, e: std::io::Error) -> ConversionError {
    ConversionError::Internal(format!("cannot list outputs in '{}': {e}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_escapes_stem() {
        let re = output_regex("report (v1.2)", "png").unwrap();
        assert!(re.is_match("report (v1.2)-1.png"));
        assert!(re.is_match("report (v1.2)-12.png"));
        assert!(!re.is_match("report (v1x2)-1.png"));
        assert!(!re.is_match("report (v1.2)-.png"));
        assert!(!re.is_match("report (v1.2)-1.jpg"));
    }

    #[tokio::test]
    async fn lists_numbered_outputs_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc-10.png", "doc-2.png", "doc-1.png", "doc-x.png", "other-1.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let found = discover_outputs(dir.path(), "doc", "png").await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doc-1.png", "doc-2.png", "doc-10.png"]);
    }

    #[tokio::test]
    async fn no_outputs_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let found = discover_outputs(dir.path(), "doc", "png").await.unwrap();
        assert!(found.is_empty());
    }
}
