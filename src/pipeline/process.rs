//! Renderer process management.
//!
//! The child is spawned with piped output and raced against the request
//! [`Scope`]. Whichever finishes first wins: a normal exit is inspected for
//! its status, a finished scope kills the child before the termination reason
//! is returned. `kill_on_drop` backs this up if the future itself is dropped,
//! so a renderer never outlives its request.

use crate::context::Scope;
use crate::error::ConversionError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Run the renderer to completion under `scope`.
///
/// Returns the combined output on a zero exit. The two streams are read
/// separately, so all of stdout comes first and all of stderr after it;
/// lines are not interleaved in the order the renderer wrote them.
/// A launch failure or nonzero exit is [`ConversionError::ExecutionFailed`]
/// carrying that output; a finished scope is `Cancelled` or
/// `DeadlineExceeded`.
pub async fn run_renderer(
    binary: &Path,
    args: &[OsString],
    input: &Path,
    scope: &Scope,
) -> Result<String, ConversionError> {
    scope.check()?;

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ConversionError::ExecutionFailed {
            input: input.to_path_buf(),
            detail: format!("failed to launch '{}': {e}", binary.display()),
        })?;

    debug!(pid = ?child.id(), "Renderer started for {}", input.display());

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let waited = tokio::select! {
        res = async { tokio::join!(child.wait(), read_pipe(stdout), read_pipe(stderr)) } => Ok(res),
        reason = scope.finished() => Err(reason),
    };

    let (status, out, err) = match waited {
        Ok(res) => res,
        Err(reason) => {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill renderer for {}: {}", input.display(), e);
            }
            debug!("Renderer for {} terminated: {}", input.display(), reason);
            return Err(reason);
        }
    };

    let mut combined = String::from_utf8_lossy(&out).into_owned();
    combined.push_str(&String::from_utf8_lossy(&err));

    let status = status.map_err(|e| ConversionError::ExecutionFailed {
        input: input.to_path_buf(),
        detail: format!("failed waiting for renderer: {e}"),
    })?;

    if !status.success() {
        return Err(ConversionError::ExecutionFailed {
            input: input.to_path_buf(),
            detail: format!("{status}, output: {}", combined.trim_end()),
        });
    }

    Ok(combined)
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut p) = pipe {
        if let Err(e) = p.read_to_end(&mut buf).await {
            debug!("Renderer pipe closed early: {}", e);
        }
    }
    buf
}
