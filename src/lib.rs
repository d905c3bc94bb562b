//! # pdf2img-agent
//!
//! Batch PDF → image conversion driven by Ghostscript.
//!
//! A request names an agent, an action, a parameter bag and a list of PDF
//! files. The [`Dispatcher`] looks the agent up in a [`CapabilityRegistry`],
//! gives the request an identifier and a working directory, and runs it under
//! a cancellable, optionally time-bounded [`Scope`]. The built-in
//! [`GhostscriptAgent`] renders every file of the batch in its own `gs`
//! process, all at once, and reports either every produced image or a
//! single error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ConversionRequest
//!  │
//!  ├─ 1. Dispatch  registry lookup, request id, work dir, timeout scope
//!  ├─ 2. Validate  inputs exist, are .pdf; parameters resolve (no writes)
//!  ├─ 3. Fan out   one gs process per file, killed when the scope ends
//!  ├─ 4. Discover  <stem>-<page>.<ext> artifacts per file
//!  ├─ 5. Merge     all succeed → every image; otherwise one error
//!  └─ 6. Respond   JobOutcome + optional deferred cleanup
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img_agent::{
//!     AgentConfig, CapabilityRegistry, ConversionRequest, Dispatcher, DispatcherConfig,
//!     GhostscriptAgent, Parameters, Scope,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = CapabilityRegistry::new();
//!     registry.register("ghostscript", Arc::new(GhostscriptAgent::new(AgentConfig::default())));
//!     let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//!
//!     let request = ConversionRequest {
//!         agent: "ghostscript".into(),
//!         action: "convert".into(),
//!         parameters: Parameters::new().with("resolution", 150.0).with("pages", "all"),
//!         files: vec!["document.pdf".into()],
//!     };
//!     let outcome = dispatcher.process(request, &Scope::new()).await;
//!     println!("{}", serde_json::to_string_pretty(&outcome.to_response())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2img-agent = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AgentConfig, AgentConfigBuilder, DispatcherConfig, ImageFormat, PageSelection,
    ResolvedParameters,
};
pub use context::{ExecutionContext, Scope};
pub use convert::{GhostscriptAgent, ACTION_CONVERT, ACTION_CONVERT_LEGACY};
pub use dispatcher::Dispatcher;
pub use error::{ConversionError, ErrorKind, FormatRole};
pub use output::{BatchResult, HealthStatus, JobMessage, JobOutcome, JobResponse};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{Capability, CapabilityRegistry};
pub use request::{ConversionRequest, ParamValue, Parameters};

pub use gs_locate;
pub use tokio_util::sync::CancellationToken;
