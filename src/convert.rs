//! The Ghostscript capability: batch validation, fan-out, aggregation.
//!
//! A batch moves through three phases:
//!
//! 1. **Validate** every input and resolve parameters. Nothing is written
//!    until both pass, so a rejected batch leaves no trace on disk.
//! 2. **Fan out** one [`ConversionTask`] per input. All run at once unless
//!    [`AgentConfig::max_concurrency`] caps them. A failing task never
//!    cancels its siblings; only the request scope does that.
//! 3. **Aggregate** through the [`ResultAggregator`]: every task must
//!    succeed, and when some do not exactly one failure is reported.

use crate::config::{AgentConfig, ResolvedParameters};
use crate::context::ExecutionContext;
use crate::error::ConversionError;
use crate::pipeline::aggregate::ResultAggregator;
use crate::pipeline::task::ConversionTask;
use crate::pipeline::validate::validate_inputs;
use crate::registry::Capability;
use crate::request::Parameters;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Action name for PDF → image conversion.
pub const ACTION_CONVERT: &str = "convert";
/// Older spelling of [`ACTION_CONVERT`], still accepted.
pub const ACTION_CONVERT_LEGACY: &str = "convertPdfToImage";

/// Capability that renders PDFs to images with Ghostscript.
#[derive(Debug, Clone, Default)]
pub struct GhostscriptAgent {
    config: AgentConfig,
}

impl GhostscriptAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Convert every file of the batch, or fail with a single error.
    ///
    /// Outputs land under the context's working directory when it has one,
    /// otherwise under the `output_dir` parameter.
    ///
    /// # Errors
    /// - [`ConversionError::NoInputFiles`], [`ConversionError::FileNotFound`],
    ///   [`ConversionError::UnsupportedFormat`], [`ConversionError::InvalidParameter`]
    ///   before anything is written
    /// - [`ConversionError::DirectoryCreationFailed`] for the output root
    /// - the first task failure otherwise
    pub async fn convert(
        &self,
        params: &Parameters,
        files: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Vec<PathBuf>, ConversionError> {
        ctx.scope.check()?;

        // ── Step 1: Validate (no side effects) ───────────────────────────────
        let inputs = validate_inputs(files)?;
        let resolved = ResolvedParameters::resolve(params)?;

        // ── Step 2: Output root ──────────────────────────────────────────────
        let output_root = ctx
            .work_dir()
            .map(PathBuf::from)
            .unwrap_or_else(|| resolved.output_dir.clone());
        tokio::fs::create_dir_all(&output_root)
            .await
            .map_err(|e| ConversionError::DirectoryCreationFailed {
                path: output_root.clone(),
                source: e,
            })?;

        let start = Instant::now();
        let total = inputs.len();
        info!(
            "Starting PDF to image conversion for {} files into {}",
            total,
            output_root.display()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        // ── Step 3: Fan out ──────────────────────────────────────────────────
        let tasks: Vec<ConversionTask> = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| ConversionTask::new(index, input, &output_root, &resolved))
            .collect();

        let aggregator = ResultAggregator::new();
        let binary = self.config.binary.as_path();
        let callback = self.config.progress_callback.as_ref();
        let resolved = &resolved;
        let agg = &aggregator;

        stream::iter(tasks.iter())
            .for_each_concurrent(self.config.max_concurrency, |task| async move {
                let file_start = Instant::now();
                info!("[{}/{}] Processing file: {}", task.index + 1, total, task.input.display());
                if let Some(cb) = callback {
                    cb.on_file_start(task.index, total, &task.input);
                }

                let outcome = task.run(binary, resolved, &ctx.scope).await;

                match &outcome {
                    Ok(outputs) => {
                        info!(
                            "[{}/{}] Completed processing file: {} ({} images, took {:?})",
                            task.index + 1,
                            total,
                            task.input.display(),
                            outputs.len(),
                            file_start.elapsed()
                        );
                        if let Some(cb) = callback {
                            cb.on_file_complete(task.index, total, &task.input, outputs);
                        }
                    }
                    Err(e) => {
                        warn!("[{}/{}] Failed {}: {}", task.index + 1, total, task.input.display(), e);
                        if let Some(cb) = callback {
                            cb.on_file_error(task.index, total, &task.input, &e.to_string());
                        }
                    }
                }
                agg.record(task.index, outcome);
            })
            .await;

        // ── Step 4: Aggregate ────────────────────────────────────────────────
        let (succeeded, output_count) = aggregator.counts();
        let elapsed = start.elapsed();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, succeeded, output_count, elapsed);
        }
        info!(
            "Completed PDF to image conversion: {}/{} files, {} images in {:?}",
            succeeded, total, output_count, elapsed
        );

        aggregator.finish()
    }
}

#[async_trait]
impl Capability for GhostscriptAgent {
    async fn execute(
        &self,
        action: &str,
        params: &Parameters,
        files: &[String],
        ctx: &ExecutionContext,
    ) -> Result<Vec<PathBuf>, ConversionError> {
        match action {
            ACTION_CONVERT | ACTION_CONVERT_LEGACY => self.convert(params, files, ctx).await,
            other => Err(ConversionError::ActionNotSupported {
                action: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Scope;
    use crate::request::keys;

    fn agent_with(binary: &str) -> GhostscriptAgent {
        GhostscriptAgent::new(AgentConfig::builder().binary(binary).build().unwrap())
    }

    #[tokio::test]
    async fn unknown_action_rejected() {
        let ctx = ExecutionContext::detached(Scope::new());
        let err = agent_with("gs")
            .execute("compress", &Parameters::new(), &["a.pdf".into()], &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::ActionNotSupported { ref action } if action == "compress"));
    }

    #[tokio::test]
    async fn empty_batch_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        let ctx = ExecutionContext::new("id", &work, Scope::new());
        let err = agent_with("gs")
            .execute(ACTION_CONVERT, &Parameters::new(), &[], &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::NoInputFiles));
        assert!(!work.exists());
    }

    #[tokio::test]
    async fn bad_output_format_never_launches_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("a.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let work = dir.path().join("work");
        let ctx = ExecutionContext::new("id", &work, Scope::new());
        let params = Parameters::new().with(keys::IMAGE_FORMAT, "tiff");

        // A renderer path that cannot exist: reaching it would be ExecutionFailed.
        let err = agent_with("/definitely/not/gs")
            .execute(
                ACTION_CONVERT_LEGACY,
                &params,
                &[pdf.to_string_lossy().into_owned()],
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedFormat { .. }));
        assert!(!work.exists());
    }

    #[tokio::test]
    async fn cancelled_scope_fails_before_validation() {
        let scope = Scope::new();
        scope.cancel();
        let ctx = ExecutionContext::detached(scope);
        let err = agent_with("gs")
            .execute(ACTION_CONVERT, &Parameters::new(), &[], &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Cancelled));
    }
}
