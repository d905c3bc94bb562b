//! # gs-locate
//!
//! Find the [Ghostscript](https://ghostscript.com/) executable for the
//! current platform, so callers of `pdf2img-agent` do not have to hard-code
//! `gs` or know that Windows ships it as `gswin64c.exe`.
//!
//! ## How it works
//!
//! On first call to [`locate_ghostscript`]:
//!
//! 1. Uses `GS_BINARY_PATH` if it points at an existing file.
//! 2. Otherwise walks every directory on `PATH` and returns the first
//!    platform candidate found there.
//!
//! The result is cached for the rest of the process lifetime.
//!
//! ## Platform support
//!
//! | OS      | Candidates                          |
//! |---------|-------------------------------------|
//! | macOS   | `gs`                                |
//! | Linux   | `gs`                                |
//! | Windows | `gswin64c.exe`, `gswin32c.exe`, `gs.exe` |
//!
//! ## Environment variable overrides
//!
//! - `GS_BINARY_PATH`: explicit path to the Ghostscript executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

/// Environment variable consulted before searching `PATH`.
pub const GS_BINARY_ENV: &str = "GS_BINARY_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by gs-locate operations.
#[derive(Error, Debug)]
pub enum GsLocateError {
    /// The current OS has no known Ghostscript executable name.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// `GS_BINARY_PATH` was set but does not name an existing file.
    #[error("GS_BINARY_PATH points to '{}', which does not exist", path.display())]
    OverrideMissing { path: PathBuf },

    /// None of the candidates were found on `PATH`.
    #[error(
        "Ghostscript not found on PATH (looked for: {candidates})\n\
Install it (e.g. `apt install ghostscript`, `brew install ghostscript`)\n\
or set GS_BINARY_PATH=/path/to/gs."
    )]
    NotFound { candidates: String },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

fn platform_candidates() -> Result<&'static [&'static str], GsLocateError> {
    match std::env::consts::OS {
        "linux" | "macos" | "freebsd" | "openbsd" | "netbsd" => Ok(&["gs"]),
        "windows" => Ok(&["gswin64c.exe", "gswin32c.exe", "gs.exe"]),
        os => Err(GsLocateError::UnsupportedPlatform { os: os.to_string() }),
    }
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path of the Ghostscript executable, searching on first call.
///
/// Safe to call from multiple threads; the search result is shared.
pub fn locate_ghostscript() -> Result<PathBuf, GsLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let override_path = std::env::var_os(GS_BINARY_ENV);
    let path_var = std::env::var_os("PATH");
    let path = locate_in(
        override_path.as_deref(),
        path_var.as_deref(),
        platform_candidates()?,
    )?;

    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` if a Ghostscript executable can be found.
pub fn is_ghostscript_available() -> bool {
    locate_ghostscript().is_ok()
}

/// Resolve the executable from an explicit override and a `PATH`-style list.
///
/// Exposed so callers with their own environment (tests, sandboxes) can run
/// the same search without touching process-wide variables.
pub fn locate_in(
    override_path: Option<&OsStr>,
    path_var: Option<&OsStr>,
    candidates: &[&str],
) -> Result<PathBuf, GsLocateError> {
    if let Some(raw) = override_path.filter(|p| !p.is_empty()) {
        let p = PathBuf::from(raw);
        if p.is_file() {
            return Ok(p);
        }
        return Err(GsLocateError::OverrideMissing { path: p });
    }

    if let Some(paths) = path_var {
        for dir in std::env::split_paths(paths) {
            if let Some(found) = find_in_dir(&dir, candidates) {
                return Ok(found);
            }
        }
    }

    Err(GsLocateError::NotFound {
        candidates: candidates.join(", "),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn find_in_dir(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
