//! Error types for the pdf2img-agent library.
//!
//! Every failure a batch can hit is a [`ConversionError`]. A batch either
//! succeeds as a whole or reports exactly one of these; there is no
//! partial-success state. [`ErrorKind`] is the payload-free classification
//! carried into a failed [`crate::output::JobOutcome`] so callers can branch
//! without matching on message text.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2img-agent library.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The inbound request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No capability is registered under the requested agent name.
    #[error("agent '{name}' not found")]
    CapabilityNotFound { name: String },

    /// The capability does not implement the requested action.
    #[error("action not supported: '{action}'")]
    ActionNotSupported { action: String },

    /// A parameter was present but could not be interpreted.
    #[error("invalid parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch contained no files.
    #[error("no input files provided")]
    NoInputFiles,

    /// An input file does not exist.
    #[error("input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// An input extension or requested output format is not supported.
    #[error("unsupported {role} format: {format}")]
    UnsupportedFormat { role: FormatRole, format: String },

    // ── Execution errors ──────────────────────────────────────────────────
    /// An output directory could not be created.
    #[error("failed to create output directory '{}': {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer could not be launched or exited unsuccessfully.
    #[error("renderer failed for '{}': {detail}", input.display())]
    ExecutionFailed { input: PathBuf, detail: String },

    /// The request scope was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request scope reached its deadline.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which side of the conversion a format error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRole {
    Input,
    Output,
}

impl std::fmt::Display for FormatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatRole::Input => f.write_str("input file"),
            FormatRole::Output => f.write_str("output image"),
        }
    }
}

/// Payload-free classification of a [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    CapabilityNotFound,
    ActionNotSupported,
    InvalidParameter,
    NoInputFiles,
    FileNotFound,
    UnsupportedFormat,
    DirectoryCreationFailed,
    ExecutionFailed,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::BadRequest(_) => ErrorKind::BadRequest,
            ConversionError::CapabilityNotFound { .. } => ErrorKind::CapabilityNotFound,
            ConversionError::ActionNotSupported { .. } => ErrorKind::ActionNotSupported,
            ConversionError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            ConversionError::NoInputFiles => ErrorKind::NoInputFiles,
            ConversionError::FileNotFound { .. } => ErrorKind::FileNotFound,
            ConversionError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ConversionError::DirectoryCreationFailed { .. } => ErrorKind::DirectoryCreationFailed,
            ConversionError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
            ConversionError::Cancelled => ErrorKind::Cancelled,
            ConversionError::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            ConversionError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` for failures caused by the request scope ending.
    pub fn is_termination(&self) -> bool {
        matches!(
            self,
            ConversionError::Cancelled | ConversionError::DeadlineExceeded
        )
    }
}
