//! Request lifecycle: identify, scope, dispatch, respond, clean up.
//!
//! The dispatcher owns nothing about conversion itself. For each request it
//! assigns a ULID, derives `<work_root>/<id>` as the working directory,
//! narrows the caller's scope when the request carries a `timeout`, and hands
//! all of that to the capability in an [`ExecutionContext`]. It never
//! retries. Deferred cleanup runs detached from the response: by the time it
//! fires the caller already has its answer, so its errors are only logged.

use crate::config::{DispatcherConfig, ResolvedParameters};
use crate::context::{ExecutionContext, Scope};
use crate::error::ConversionError;
use crate::output::{BatchResult, HealthStatus, JobOutcome};
use crate::registry::CapabilityRegistry;
use crate::request::{keys, ConversionRequest};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

/// Entry point for conversion requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: CapabilityRegistry,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: CapabilityRegistry, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Process one request under the caller's `scope`.
    ///
    /// Always returns an outcome; failures are folded into
    /// [`JobOutcome::Failure`].
    pub async fn process(&self, request: ConversionRequest, scope: &Scope) -> JobOutcome {
        if let Err(e) = scope.check() {
            return JobOutcome::failure(&e);
        }

        let Some(capability) = self.registry.get(&request.agent) else {
            warn!("Agent '{}' not found", request.agent);
            return JobOutcome::failure(&ConversionError::CapabilityNotFound {
                name: request.agent,
            });
        };

        let request_id = generate_request_id();
        let work_dir = self.config.work_root.join(&request_id);
        let span = info_span!(
            "request",
            id = %request_id,
            agent = %request.agent,
            action = %request.action
        );

        async move {
            let start = Instant::now();
            let effective = match ResolvedParameters::timeout_of(&request.parameters) {
                Some(timeout) => {
                    debug!("Request timeout: {:?}", timeout);
                    scope.child_with_timeout(timeout)
                }
                None => scope.clone(),
            };
            let ctx = ExecutionContext::new(request_id.clone(), work_dir.clone(), effective);

            info!("Processing {} files", request.files.len());
            let result = capability
                .execute(&request.action, &request.parameters, &request.files, &ctx)
                .await;

            if ResolvedParameters::cleanup_of(&request.parameters) {
                schedule_cleanup(work_dir, self.config.cleanup_delay);
            }

            match result {
                Ok(files) => {
                    let elapsed = start.elapsed();
                    info!("Request completed: {} output files in {:?}", files.len(), elapsed);
                    JobOutcome::Success {
                        id: request_id,
                        result: BatchResult {
                            output_files: files
                                .iter()
                                .map(|p| p.to_string_lossy().into_owned())
                                .collect(),
                            raw_processor_output: request
                                .parameters
                                .text(keys::PROCESSOR_OUTPUT)
                                .or_else(|| request.parameters.text(keys::PROCESSOR_OUTPUT_LEGACY))
                                .unwrap_or_default()
                                .to_string(),
                            metadata: request.parameters.strings(keys::METADATA).unwrap_or_default(),
                            processing_time: format_elapsed(elapsed),
                        },
                    }
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    JobOutcome::failure(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "OK".to_string(),
            time: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Unique, time-ordered request identifier.
pub fn generate_request_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Delete `dir` and everything below it after `delay`, in the background.
pub fn schedule_cleanup(dir: PathBuf, delay: Duration) -> JoinHandle<()> {
    debug!("Cleanup of {} scheduled in {:?}", dir.display(), delay);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => info!("Removed working directory {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Working directory {} already gone", dir.display())
            }
            Err(e) => warn!("Failed to remove working directory {}: {}", dir.display(), e),
        }
    })
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
