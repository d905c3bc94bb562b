//! Input validation: the side-effect-free pass over a whole batch.
//!
//! Every file is checked before the first directory is created, so a batch
//! with one bad entry leaves the filesystem exactly as it found it.

use crate::config::SUPPORTED_INPUT_EXTENSIONS;
use crate::error::{ConversionError, FormatRole};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a batch of input paths, in request order.
///
/// The first violation fails the whole batch:
/// - empty list → [`ConversionError::NoInputFiles`]
/// - missing file → [`ConversionError::FileNotFound`]
/// - extension not in the input allow-list → [`ConversionError::UnsupportedFormat`]
///
/// The extension check ignores case: `report.PDF` is accepted. Callers
/// migrating from a case-sensitive service will see more files pass.
pub fn validate_inputs(files: &[String]) -> Result<Vec<PathBuf>, ConversionError> {
    if files.is_empty() {
        return Err(ConversionError::NoInputFiles);
    }

    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        let path = PathBuf::from(file);
        if !path.exists() {
            return Err(ConversionError::FileNotFound { path });
        }
        check_extension(&path)?;
        inputs.push(path);
    }

    debug!("Validated {} input files", inputs.len());
    Ok(inputs)
}

fn check_extension(path: &Path) -> Result<(), ConversionError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext {
        Some(ref e) if SUPPORTED_INPUT_EXTENSIONS.contains(e.as_str()) => Ok(()),
        Some(e) => Err(ConversionError::UnsupportedFormat {
            role: FormatRole::Input,
            format: format!(".{e}"),
        }),
        None => Err(ConversionError::UnsupportedFormat {
            role: FormatRole::Input,
            format: "(no extension)".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> String {
        let p = dir.join(name);
        std::fs::write(&p, b"%PDF-1.4\n").unwrap();
        p.to_string_lossy().into_owned()
    }

    #[test]
    fn empty_batch_rejected() {
        assert!(matches!(
            validate_inputs(&[]),
            Err(ConversionError::NoInputFiles)
        ));
    }

    #[test]
    fn accepts_pdf_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.pdf");
        let b = touch(dir.path(), "B.PDF");
        let inputs = validate_inputs(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(inputs, vec![PathBuf::from(a), PathBuf::from(b)]);
    }

    #[test]
    fn missing_file_reported_first() {
        let dir = tempfile::tempdir().unwrap();
        let good = touch(dir.path(), "a.pdf");
        let missing = dir.path().join("nope.pdf").to_string_lossy().into_owned();
        let err = validate_inputs(&[good, missing.clone()]).unwrap_err();
        match err {
            ConversionError::FileNotFound { path } => assert_eq!(path, PathBuf::from(missing)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let doc = touch(dir.path(), "notes.docx");
        let bare = touch(dir.path(), "README");

        let err = validate_inputs(&[doc]).unwrap_err();
        assert!(err.to_string().contains(".docx"), "got: {err}");

        let err = validate_inputs(&[bare]).unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn validation_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = touch(dir.path(), "a.pdf");
        let _ = validate_inputs(&[good, "missing.pdf".into()]);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
