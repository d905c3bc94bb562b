//! Configuration types for batch PDF-to-image conversion.
//!
//! Two layers of configuration exist:
//!
//! * Service-level settings fixed at startup: [`AgentConfig`] for the
//!   Ghostscript capability (built via [`AgentConfigBuilder`]) and
//!   [`DispatcherConfig`] for request lifecycle.
//! * Per-request settings: [`ResolvedParameters`], derived once from the raw
//!   parameter bag of each request and immutable afterwards.
//!
//! The format allow-lists and the format→device table are immutable lookup
//! tables built on first use.

use crate::error::{ConversionError, FormatRole};
use crate::progress::ProgressCallback;
use crate::request::{keys, Parameters};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ── Lookup tables ─────────────────────────────────────────────────────────

/// Input extensions (lowercase, without the dot) the renderer accepts.
pub static SUPPORTED_INPUT_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["pdf"]));

/// Output image formats a request may ask for.
pub static SUPPORTED_OUTPUT_FORMATS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["jpg", "jpeg", "png"]));

static DEVICE_BY_FORMAT: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("jpg", "jpeg"), ("jpeg", "jpeg"), ("png", "png16m")])
});

/// Device used for any format missing from the table.
pub const FALLBACK_DEVICE: &str = "png16m";

/// Ghostscript output device for an image format.
pub fn device_for(format: &str) -> &'static str {
    DEVICE_BY_FORMAT
        .get(format)
        .copied()
        .unwrap_or(FALLBACK_DEVICE)
}

// ── Per-request parameters ────────────────────────────────────────────────

pub const DEFAULT_RESOLUTION: u32 = 72;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    #[default]
    Png,
}

impl ImageFormat {
    /// Parse a format name (case-insensitive) against the allow-list.
    pub fn parse(raw: &str) -> Result<Self, ConversionError> {
        let lower = raw.trim().to_ascii_lowercase();
        if !SUPPORTED_OUTPUT_FORMATS.contains(lower.as_str()) {
            return Err(ConversionError::UnsupportedFormat {
                role: FormatRole::Output,
                format: raw.to_string(),
            });
        }
        Ok(match lower.as_str() {
            "jpg" => ImageFormat::Jpg,
            "jpeg" => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        })
    }

    /// File extension, also the key into the device table.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    pub fn device(self) -> &'static str {
        device_for(self.extension())
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which pages of each document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page.
    All,
    /// A single page (1-indexed).
    Single(u32),
}

impl Default for PageSelection {
    fn default() -> Self {
        PageSelection::Single(1)
    }
}

impl PageSelection {
    /// Parse `"all"` or a positive page number.
    pub fn parse(raw: &str) -> Result<Self, ConversionError> {
        let s = raw.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        if s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }
        match s.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(PageSelection::Single(n)),
            _ => Err(ConversionError::InvalidParameter {
                key: keys::PAGES.to_string(),
                reason: format!("expected a page number ≥ 1 or \"all\", got '{raw}'"),
            }),
        }
    }

    /// `(first, last)` page bounds, or `None` when rendering everything.
    pub fn bounds(self) -> Option<(u32, u32)> {
        match self {
            PageSelection::All => None,
            PageSelection::Single(n) => Some((n, n)),
        }
    }
}

/// Conversion settings resolved from a request's parameter bag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    /// Rendering resolution in DPI. Default: 72.
    pub resolution: u32,
    /// Output image format. Default: png.
    pub image_format: ImageFormat,
    /// Enable text and graphics antialiasing. Default: false.
    pub anti_aliasing: bool,
    /// Page selection. Default: page 1.
    pub pages: PageSelection,
    /// Output root used when no working directory was provisioned.
    pub output_dir: PathBuf,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Delete the working directory after the grace period.
    pub cleanup: bool,
}

impl Default for ResolvedParameters {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            image_format: ImageFormat::default(),
            anti_aliasing: false,
            pages: PageSelection::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: None,
            cleanup: false,
        }
    }
}

impl ResolvedParameters {
    /// Apply defaults to the raw parameter bag and validate the result.
    ///
    /// Missing or non-positive numbers fall back to their defaults. An
    /// unknown output format or malformed page selector is an error; nothing
    /// here touches the filesystem.
    pub fn resolve(params: &Parameters) -> Result<Self, ConversionError> {
        let resolution = params
            .number(keys::RESOLUTION)
            .filter(|r| r.is_finite() && *r >= 1.0)
            .map(|r| r as u32)
            .unwrap_or(DEFAULT_RESOLUTION);

        let image_format = match params.text(keys::IMAGE_FORMAT) {
            Some(f) if !f.trim().is_empty() => ImageFormat::parse(f)?,
            _ => ImageFormat::default(),
        };

        let pages = match params.get(keys::PAGES) {
            None => PageSelection::default(),
            Some(_) => match (params.text(keys::PAGES), params.number(keys::PAGES)) {
                (Some(s), _) => PageSelection::parse(s)?,
                (None, Some(n)) if n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64 => {
                    PageSelection::Single(n as u32)
                }
                _ => {
                    return Err(ConversionError::InvalidParameter {
                        key: keys::PAGES.to_string(),
                        reason: "expected a page number or \"all\"".to_string(),
                    })
                }
            },
        };

        let output_dir = params
            .text(keys::OUTPUT_DIR)
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Ok(Self {
            resolution,
            image_format,
            anti_aliasing: params.flag(keys::ANTI_ALIASING).unwrap_or(false),
            pages,
            output_dir,
            timeout: Self::timeout_of(params),
            cleanup: Self::cleanup_of(params),
        })
    }

    /// The `timeout` parameter, if present, positive and representable as a
    /// [`Duration`]. Larger values mean no timeout.
    pub fn timeout_of(params: &Parameters) -> Option<Duration> {
        params
            .number(keys::TIMEOUT)
            .filter(|t| t.is_finite() && *t > 0.0)
            .and_then(|t| Duration::try_from_secs_f64(t).ok())
    }

    pub fn cleanup_of(params: &Parameters) -> bool {
        params.flag(keys::CLEANUP_TEMP).unwrap_or(false)
    }
}

// ── Service-level configuration ───────────────────────────────────────────

/// Configuration for the Ghostscript capability.
///
/// Built via [`AgentConfig::builder()`] or using [`AgentConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2img_agent::AgentConfig;
///
/// let config = AgentConfig::builder()
///     .binary("/usr/bin/gs")
///     .max_concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AgentConfig {
    /// Renderer executable. Default: `gs`, resolved through `PATH`.
    pub binary: PathBuf,

    /// Upper bound on renderer processes running at once for one batch.
    /// Default: `None` (one process per input file, all at once).
    pub max_concurrency: Option<usize>,

    /// Receives per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("gs"),
            max_concurrency: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("binary", &self.binary)
            .field("max_concurrency", &self.max_concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl AgentConfig {
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.binary = path.into();
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = Some(n);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AgentConfig, ConversionError> {
        if self.config.max_concurrency == Some(0) {
            return Err(ConversionError::InvalidParameter {
                key: "max_concurrency".into(),
                reason: "must be ≥ 1".into(),
            });
        }
        if self.config.binary.as_os_str().is_empty() {
            return Err(ConversionError::InvalidParameter {
                key: "binary".into(),
                reason: "renderer path is empty".into(),
            });
        }
        Ok(self.config)
    }
}

/// Request-lifecycle settings for the [`crate::Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Parent of every per-request working directory. Default: `temp/output`.
    pub work_root: PathBuf,
    /// Delay before a requested cleanup deletes the working directory.
    /// Default: 5 minutes.
    pub cleanup_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("temp").join("output"),
            cleanup_delay: Duration::from_secs(5 * 60),
        }
    }
}
