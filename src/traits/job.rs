//! Job-start collaborator.
//!
//! The controller only needs one thing from the backend before it can stream:
//! an analysis id. [`JobLauncher`] is that seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::http::HttpError;

/// What to analyse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTarget {
    /// Repository identifier understood by the backend
    pub repository: String,
    /// Specific commit, or the default branch head when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl JobTarget {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            commit_sha: None,
        }
    }

    pub fn with_commit(mut self, sha: impl Into<String>) -> Self {
        self.commit_sha = Some(sha.into());
        self
    }
}

/// Body returned by the job-start endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStartResponse {
    pub success: bool,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStartResponse {
    /// A successful response carrying `analysis_id`.
    pub fn started(analysis_id: impl Into<String>) -> Self {
        Self {
            success: true,
            analysis_id: Some(analysis_id.into()),
            error: None,
        }
    }

    /// A failed response carrying `error`.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis_id: None,
            error: Some(error.into()),
        }
    }
}

/// Failure to obtain any answer from the job-start endpoint.
#[derive(Debug, Error)]
pub enum JobStartError {
    /// The request could not be delivered
    #[error("job start request failed: {0}")]
    Transport(#[from] HttpError),

    /// The endpoint answered with something that is not a start response
    #[error("invalid job start response: {0}")]
    InvalidResponse(String),
}

/// Starts analysis jobs on the backend.
#[async_trait]
pub trait JobLauncher: Send + Sync {
    /// Ask the backend to start analysing `target`.
    ///
    /// A backend-side refusal is `Ok` with `success == false`; `Err` means
    /// no usable answer was received.
    async fn start_job(&self, target: &JobTarget) -> Result<JobStartResponse, JobStartError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_target_serialization_omits_missing_commit() {
        let json = serde_json::to_string(&JobTarget::new("org/repo")).unwrap();
        assert_eq!(json, r#"{"repository":"org/repo"}"#);

        let json = serde_json::to_string(&JobTarget::new("org/repo").with_commit("abc")).unwrap();
        assert_eq!(json, r#"{"repository":"org/repo","commit_sha":"abc"}"#);
    }

    #[test]
    fn test_job_start_response_camel_case() {
        let response: JobStartResponse =
            serde_json::from_str(r#"{"success":true,"analysisId":"an-1"}"#).unwrap();
        assert_eq!(response, JobStartResponse::started("an-1"));

        let response: JobStartResponse =
            serde_json::from_str(r#"{"success":false,"error":"quota exceeded"}"#).unwrap();
        assert_eq!(response, JobStartResponse::rejected("quota exceeded"));
    }

    #[test]
    fn test_job_start_error_display() {
        let err: JobStartError = HttpError::Timeout("30s".to_string()).into();
        assert_eq!(
            err.to_string(),
            "job start request failed: Request timeout: 30s"
        );
    }
}
