//! Job outcome and the response shapes handed back to the transport layer.

use crate::error::{ConversionError, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a successful batch produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub output_files: Vec<String>,
    /// Passthrough of the `processor_output` parameter.
    pub raw_processor_output: String,
    /// Passthrough of the `metadata` parameter.
    pub metadata: Vec<String>,
    /// Elapsed processing time, e.g. `"1.234s"`.
    pub processing_time: String,
}

/// Final result of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Success { id: String, result: BatchResult },
    Failure { kind: ErrorKind, error: String },
}

impl JobOutcome {
    pub fn failure(err: &ConversionError) -> Self {
        JobOutcome::Failure {
            kind: err.kind(),
            error: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    /// Request identifier; only successful outcomes carry one.
    pub fn id(&self) -> Option<&str> {
        match self {
            JobOutcome::Success { id, .. } => Some(id),
            JobOutcome::Failure { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&BatchResult> {
        match self {
            JobOutcome::Success { result, .. } => Some(result),
            JobOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            JobOutcome::Success { .. } => None,
            JobOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            JobOutcome::Success { .. } => None,
            JobOutcome::Failure { error, .. } => Some(error),
        }
    }

    /// Wire shape of this outcome.
    pub fn to_response(&self) -> JobResponse {
        match self {
            JobOutcome::Success { id, result } => JobResponse {
                success: true,
                message: Some(JobMessage {
                    id: id.clone(),
                    result: result.clone(),
                }),
                error: None,
            },
            JobOutcome::Failure { error, .. } => JobResponse {
                success: false,
                message: None,
                error: Some(error.clone()),
            },
        }
    }
}

/// `{ success, message: { id, result } }` or `{ success: false, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<JobMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    pub id: String,
    pub result: BatchResult,
}

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub time: DateTime<Utc>,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_response_shape() {
        let outcome = JobOutcome::Success {
            id: "01J0000000000000000000000".into(),
            result: BatchResult {
                output_files: vec!["a/a-1.png".into()],
                raw_processor_output: String::new(),
                metadata: vec![],
                processing_time: "0.012s".into(),
            },
        };
        let value = serde_json::to_value(outcome.to_response()).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "message": {
                    "id": "01J0000000000000000000000",
                    "result": {
                        "output_files": ["a/a-1.png"],
                        "raw_processor_output": "",
                        "metadata": [],
                        "processing_time": "0.012s"
                    }
                }
            })
        );
    }

    #[test]
    fn failure_response_shape() {
        let outcome = JobOutcome::failure(&ConversionError::NoInputFiles);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NoInputFiles));
        assert!(outcome.id().is_none());
        let value = serde_json::to_value(outcome.to_response()).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "no input files provided"})
        );
    }
}
