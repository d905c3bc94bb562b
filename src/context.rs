//! Per-request execution context and cancellation scope.
//!
//! A [`Scope`] pairs a [`CancellationToken`] with an optional deadline. Every
//! task of a request shares one scope; when it finishes (explicit cancel or
//! deadline) each in-flight task kills its renderer and reports the reason.
//!
//! [`ExecutionContext`] carries the request identifier, working directory and
//! scope down to the capability next to, not inside, the parameter bag.

use crate::error::ConversionError;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation/timeout scope threaded through a request.
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// An unbounded scope that ends only when cancelled.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// An unbounded scope driven by an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Child scope bounded by `timeout`.
    ///
    /// Cancelling `self` cancels the child; cancelling the child leaves `self`
    /// untouched. The child's deadline never extends past an outer deadline.
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (Instant::now().checked_add(timeout), self.deadline) {
            (Some(candidate), Some(outer)) => Some(candidate.min(outer)),
            (Some(candidate), None) => Some(candidate),
            (None, outer) => outer,
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Err` with the termination reason if the scope has already ended.
    pub fn check(&self) -> Result<(), ConversionError> {
        if self.token.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Err(ConversionError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the scope ends, yielding the reason.
    pub async fn finished(&self) -> ConversionError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ConversionError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ConversionError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ConversionError::Cancelled
            }
        }
    }
}

/// Everything a capability needs to know about the request besides its
/// parameters and files.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub request_id: String,
    /// Per-request working directory. When set it is the output root.
    pub work_dir: Option<PathBuf>,
    pub scope: Scope,
}

impl ExecutionContext {
    pub fn new(request_id: impl Into<String>, work_dir: impl Into<PathBuf>, scope: Scope) -> Self {
        Self {
            request_id: request_id.into(),
            work_dir: Some(work_dir.into()),
            scope,
        }
    }

    /// Context for calling a capability directly, outside the dispatcher.
    /// Output goes to the request's `output_dir` parameter.
    pub fn detached(scope: Scope) -> Self {
        Self {
            request_id: String::new(),
            work_dir: None,
            scope,
        }
    }

    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }
}
