//! CLI binary for pdf2img-agent.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `ConversionRequest`, runs it through a `Dispatcher` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img_agent::{
    gs_locate, AgentConfig, BatchProgressCallback, CapabilityRegistry, ConversionRequest,
    Dispatcher, DispatcherConfig, GhostscriptAgent, JobOutcome, Parameters, ProgressCallback,
    Scope, ACTION_CONVERT,
};
use pdf2img_agent::request::keys;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

/// Name the Ghostscript capability is registered under.
const AGENT_NAME: &str = "ghostscript";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Live progress bar plus one log line per finished file. Files finish out
/// of order, so start times are keyed by batch index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Validating inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&index)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Rendering");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total_files} files…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total_files: usize, input: &Path) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index, Instant::now());
        self.bar.set_message(file_name(input));
    }

    fn on_file_complete(&self, index: usize, total_files: usize, input: &Path, outputs: &[PathBuf]) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index + 1,
            total_files,
            file_name(input),
            dim(&format!("{:>3} images", outputs.len())),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total_files: usize, input: &Path, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Renderer output can be long; keep one line per file.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} File {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total_files,
            file_name(input),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(
        &self,
        total_files: usize,
        succeeded: usize,
        output_files: usize,
        elapsed: Duration,
    ) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files → {} images in {:.1}s",
                green("✔"),
                bold(&succeeded.to_string()),
                bold(&output_files.to_string()),
                elapsed.as_secs_f64()
            );
        } else {
            eprintln!(
                "{} {}/{} files rendered  ({} failed)",
                red("✘"),
                bold(&succeeded.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # First page of each file as PNG at 72 DPI
  pdf2img a.pdf b.pdf

  # Every page as JPEG at 150 DPI, four renderers at a time
  pdf2img --format jpg --resolution 150 --pages all -c 4 docs/*.pdf

  # Abort if the batch takes longer than 30 seconds
  pdf2img --timeout 30 big.pdf

  # Run a JSON request and print the JSON response
  pdf2img --request job.json --json
  echo '{"agent":"ghostscript","action":"convert","files":["a.pdf"]}' | pdf2img --request - --json

  # Liveness check
  pdf2img --health

OUTPUT LAYOUT:
  Every request gets its own directory under --work-root named after its
  request id. Each input produces <stem>-<page>.<format> files there.

ENVIRONMENT VARIABLES:
  GS_BINARY_PATH          Ghostscript executable (skips PATH search)
  PDF2IMG_*               Fallback for any long flag, e.g. PDF2IMG_RESOLUTION
  RUST_LOG                Override the log filter
"#;

/// Render PDF files to images with Ghostscript.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Render PDF files to images with Ghostscript, one process per file",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to convert.
    files: Vec<String>,

    /// Read a JSON request from this file (`-` for stdin) instead of flags.
    #[arg(long, env = "PDF2IMG_REQUEST", conflicts_with = "files")]
    request: Option<String>,

    /// Rendering resolution in DPI.
    #[arg(short, long, env = "PDF2IMG_RESOLUTION")]
    resolution: Option<u32>,

    /// Output image format: png, jpg, jpeg.
    #[arg(short, long, env = "PDF2IMG_FORMAT")]
    format: Option<String>,

    /// Enable text and graphics antialiasing.
    #[arg(long, env = "PDF2IMG_ANTI_ALIASING")]
    anti_aliasing: bool,

    /// Page selection: a page number or `all`.
    #[arg(short, long, env = "PDF2IMG_PAGES")]
    pages: Option<String>,

    /// Abort the batch after this many seconds.
    #[arg(long, env = "PDF2IMG_TIMEOUT")]
    timeout: Option<f64>,

    /// Parent directory for per-request output directories.
    #[arg(short, long, env = "PDF2IMG_WORK_ROOT", default_value = "temp/output")]
    work_root: PathBuf,

    /// Ghostscript executable. Located on PATH when omitted.
    #[arg(long, env = "PDF2IMG_GS_PATH")]
    gs_path: Option<PathBuf>,

    /// Maximum renderer processes at once. Unlimited when omitted.
    #[arg(short, long, env = "PDF2IMG_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Print the JSON response instead of a file list.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Print the health status and exit.
    #[arg(long)]
    health: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let dispatcher_config = DispatcherConfig {
        work_root: cli.work_root.clone(),
        ..DispatcherConfig::default()
    };

    // ── Health ───────────────────────────────────────────────────────────
    if cli.health {
        let dispatcher = Dispatcher::new(CapabilityRegistry::new(), dispatcher_config);
        println!(
            "{}",
            serde_json::to_string_pretty(&dispatcher.health())
                .context("Failed to serialise health status")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    // ── Renderer ─────────────────────────────────────────────────────────
    let binary = match cli.gs_path.clone() {
        Some(path) => path,
        None => gs_locate::locate_ghostscript()
            .context("Ghostscript not found; install it or set GS_BINARY_PATH")?,
    };

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = AgentConfig::builder().binary(binary);
    if let Some(n) = cli.concurrency {
        builder = builder.max_concurrency(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let agent_config = builder.build().context("Invalid configuration")?;

    let mut registry = CapabilityRegistry::new();
    registry.register(AGENT_NAME, Arc::new(GhostscriptAgent::new(agent_config)));
    let dispatcher = Dispatcher::new(registry, dispatcher_config);

    let request = build_request(&cli).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let scope = Scope::new();
    let on_interrupt = scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = dispatcher.process(request, &scope).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.to_response())
                .context("Failed to serialise response")?
        );
    } else {
        match &outcome {
            JobOutcome::Success { id, result } => {
                for file in &result.output_files {
                    println!("{file}");
                }
                if !cli.quiet && !show_progress {
                    eprintln!(
                        "{} request {}  {} images  {}",
                        green("✔"),
                        dim(id),
                        result.output_files.len(),
                        result.processing_time
                    );
                }
            }
            JobOutcome::Failure { error, .. } => {
                eprintln!("{} {}", red("✘"), error);
            }
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Build the request from `--request` or from the flags.
async fn build_request(cli: &Cli) -> Result<ConversionRequest> {
    if let Some(ref source) = cli.request {
        let raw = if source == "-" {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read request from stdin")?;
            buf
        } else {
            tokio::fs::read_to_string(source)
                .await
                .with_context(|| format!("Failed to read request from {source:?}"))?
        };
        return ConversionRequest::from_json(&raw).context("Invalid request");
    }

    let mut parameters = Parameters::new();
    if let Some(r) = cli.resolution {
        parameters.insert(keys::RESOLUTION, f64::from(r));
    }
    if let Some(ref f) = cli.format {
        parameters.insert(keys::IMAGE_FORMAT, f.as_str());
    }
    if cli.anti_aliasing {
        parameters.insert(keys::ANTI_ALIASING, true);
    }
    if let Some(ref p) = cli.pages {
        parameters.insert(keys::PAGES, p.as_str());
    }
    if let Some(t) = cli.timeout {
        parameters.insert(keys::TIMEOUT, t);
    }

    Ok(ConversionRequest {
        agent: AGENT_NAME.to_string(),
        action: ACTION_CONVERT.to_string(),
        parameters,
        files: cli.files.clone(),
    })
}
