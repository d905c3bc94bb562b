//! Per-file conversion task: output layout, renderer arguments, execution.
//!
//! A task owns `<output root>/<stem>/` exclusively, where `<stem>` is the
//! input's file name without its extension. Sibling tasks therefore never
//! write to the same place, unless two inputs share a stem, in which case
//! they share a subdirectory.

use crate::config::ResolvedParameters;
use crate::context::Scope;
use crate::error::ConversionError;
use crate::pipeline::discover::{discover_outputs, PAGE_PLACEHOLDER};
use crate::pipeline::process::run_renderer;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One input file's unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionTask {
    /// 0-based position in the request.
    pub index: usize,
    pub input: PathBuf,
    /// `<output root>/<stem>`.
    pub output_dir: PathBuf,
    /// `<output_dir>/<stem>-%d.<ext>`.
    pub output_pattern: PathBuf,
    stem: String,
    ext: &'static str,
}

impl ConversionTask {
    pub fn new(index: usize, input: PathBuf, output_root: &Path, params: &ResolvedParameters) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("input-{index}"));
        let ext = params.image_format.extension();
        let output_dir = output_root.join(&stem);
        let output_pattern = output_dir.join(format!("{stem}-{PAGE_PLACEHOLDER}.{ext}"));
        Self {
            index,
            input,
            output_dir,
            output_pattern,
            stem,
            ext,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Ghostscript argument vector; deterministic for given parameters.
    pub fn args(&self, params: &ResolvedParameters) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-dNOPAUSE".into(),
            "-dBATCH".into(),
            "-dSAFER".into(),
            format!("-r{}", params.resolution).into(),
            format!("-sDEVICE={}", params.image_format.device()).into(),
        ];

        if params.anti_aliasing {
            args.push("-dTextAlphaBits=4".into());
            args.push("-dGraphicsAlphaBits=4".into());
        }

        if let Some((first, last)) = params.pages.bounds() {
            args.push(format!("-dFirstPage={first}").into());
            args.push(format!("-dLastPage={last}").into());
        }

        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(self.output_pattern.as_os_str());
        args.push(output_arg);
        args.push(self.input.clone().into_os_string());
        args
    }

    /// Create the subdirectory, run the renderer, and list what it produced.
    pub async fn run(
        &self,
        binary: &Path,
        params: &ResolvedParameters,
        scope: &Scope,
    ) -> Result<Vec<PathBuf>, ConversionError> {
        // Queued tasks may start after the scope ended; leave no directory behind.
        scope.check()?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ConversionError::DirectoryCreationFailed {
                path: self.output_dir.clone(),
                source: e,
            })?;

        let args = self.args(params);
        debug!(
            "Output pattern for {}: {}",
            self.input.display(),
            self.output_pattern.display()
        );
        debug!("Renderer args: {:?}", args);

        let output = run_renderer(binary, &args, &self.input, scope).await?;
        if !output.is_empty() {
            debug!("Renderer output for {}: {}", self.input.display(), output.trim_end());
        }

        discover_outputs(&self.output_dir, &self.stem, self.ext).await
    }
}
