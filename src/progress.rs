//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::AgentConfigBuilder::progress_callback`] to receive events
//! as the Ghostscript capability works through a batch.
//!
//! Callers can forward events to a terminal progress bar, a metrics
//! registry, or a log without the library knowing how the host application
//! reports. The final [`BatchProgressCallback::on_batch_complete`] call
//! carries the counts and duration a metrics collector wants.
//!
//! # Example
//!
//! ```rust
//! use pdf2img_agent::{AgentConfig, BatchProgressCallback};
//! use std::path::{Path, PathBuf};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     outputs: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, _index: usize, _total: usize, _input: &Path, outputs: &[PathBuf]) {
//!         self.outputs.fetch_add(outputs.len(), Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { outputs: AtomicUsize::new(0) });
//!
//! let config = AgentConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Called by the capability as it processes each file of a batch.
///
/// Implementations must be `Send + Sync`: the `on_file_*` methods are called
/// concurrently while renderer processes run side by side. All methods
/// default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after validation, before any renderer is launched.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before the renderer is launched for a file.
    ///
    /// `index` is the 0-based position of the file in the request.
    fn on_file_start(&self, index: usize, total_files: usize, input: &Path) {
        let _ = (index, total_files, input);
    }

    /// Called when a file rendered successfully.
    fn on_file_complete(&self, index: usize, total_files: usize, input: &Path, outputs: &[PathBuf]) {
        let _ = (index, total_files, input, outputs);
    }

    /// Called when a file failed.
    fn on_file_error(&self, index: usize, total_files: usize, input: &Path, error: &str) {
        let _ = (index, total_files, input, error);
    }

    /// Called once after every file has finished, successfully or not.
    ///
    /// * `succeeded`    : files that rendered without error
    /// * `output_files` : images produced across the batch
    /// * `elapsed`      : wall-clock time since validation passed
    fn on_batch_complete(
        &self,
        total_files: usize,
        succeeded: usize,
        output_files: usize,
        elapsed: Duration,
    ) {
        let _ = (total_files, succeeded, output_files, elapsed);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AgentConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
