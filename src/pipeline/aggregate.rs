//! Result aggregation across concurrently running tasks.
//!
//! All shared state of a batch lives here behind a single mutex: the
//! outputs of successful tasks and a queue of failures (one entry at most
//! per task). [`ResultAggregator::finish`] drains it once, after every task
//! has joined.

use crate::error::ConversionError;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    outputs: Vec<(usize, Vec<PathBuf>)>,
    failures: VecDeque<(usize, ConversionError)>,
}

/// Thread-safe merge point for task outcomes.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<Inner>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the task at `index`. Call once per task.
    pub fn record(&self, index: usize, outcome: Result<Vec<PathBuf>, ConversionError>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(paths) => inner.outputs.push((index, paths)),
            Err(e) => inner.failures.push_back((index, e)),
        }
    }

    /// `(succeeded tasks, output files so far)`.
    pub fn counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let files = inner.outputs.iter().map(|(_, p)| p.len()).sum();
        (inner.outputs.len(), files)
    }

    /// Merge everything recorded.
    ///
    /// Any failure wins over all successes: the first one recorded is
    /// returned, the rest are dropped. Otherwise the outputs are returned
    /// ordered by task index, each task's files in the order it reported.
    pub fn finish(self) -> Result<Vec<PathBuf>, ConversionError> {
        let mut inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, first)) = inner.failures.pop_front() {
            return Err(first);
        }
        inner.outputs.sort_by_key(|(index, _)| *index);
        Ok(inner.outputs.into_iter().flat_map(|(_, p)| p).collect())
    }
}
