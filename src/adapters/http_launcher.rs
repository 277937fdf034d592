//! Job launcher backed by the analysis REST endpoint.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::traits::{HttpClient, JobLauncher, JobStartError, JobStartResponse, JobTarget};

/// Starts jobs by POSTing the target as JSON to the configured start URL.
///
/// Any body that parses as a [`JobStartResponse`] is returned as-is,
/// whatever the status. A non-2xx status with an unreadable body becomes a
/// rejection; a 2xx with an unreadable body is an error.
pub struct HttpJobLauncher {
    http: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl HttpJobLauncher {
    pub fn new(http: Arc<dyn HttpClient>, config: ClientConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl JobLauncher for HttpJobLauncher {
    async fn start_job(&self, target: &JobTarget) -> Result<JobStartResponse, JobStartError> {
        let url = self.config.start_url();
        let body = serde_json::to_string(target)
            .map_err(|e| JobStartError::InvalidResponse(e.to_string()))?;

        debug!("Starting analysis for {} at {}", target.repository, url);
        let response = self
            .http
            .post(&url, &body, &self.config.json_headers())
            .await?;

        match response.json::<JobStartResponse>() {
            Ok(parsed) => Ok(parsed),
            Err(_) if !response.is_success() => {
                warn!("Job start returned HTTP {} without a start response", response.status);
                Ok(JobStartResponse::rejected(format!(
                    "Failed to start analysis (HTTP {})",
                    response.status
                )))
            }
            Err(e) => Err(JobStartError::InvalidResponse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;

    const START_URL: &str = "http://localhost:8000/api/analyses";

    fn launcher(http: &MockHttpClient) -> HttpJobLauncher {
        HttpJobLauncher::new(
            Arc::new(http.clone()),
            ClientConfig::default().with_token("tok"),
        )
    }

    fn reply(status: u16, body: &str) -> MockResponse {
        MockResponse::Success(Response::new(status, Bytes::from(body.to_string())))
    }

    #[tokio::test]
    async fn test_posts_target_and_parses_response() {
        let http = MockHttpClient::new();
        http.set_response(START_URL, reply(201, r#"{"success":true,"analysisId":"an-5"}"#));

        let target = JobTarget::new("org/repo").with_commit("deadbeef");
        let response = launcher(&http).start_job(&target).await.unwrap();
        assert_eq!(response, JobStartResponse::started("an-5"));

        let requests = http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].body.as_deref(),
            Some(r#"{"repository":"org/repo","commit_sha":"deadbeef"}"#)
        );
        assert_eq!(
            requests[0].headers.get("Authorization"),
            Some(&"Bearer tok".to_string())
        );
        assert_eq!(
            requests[0].headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[tokio::test]
    async fn test_error_body_is_passed_through() {
        let http = MockHttpClient::new();
        http.set_response(START_URL, reply(409, r#"{"success":false,"error":"Already running"}"#));

        let response = launcher(&http).start_job(&JobTarget::new("r")).await.unwrap();
        assert_eq!(response, JobStartResponse::rejected("Already running"));
    }

    #[tokio::test]
    async fn test_unparseable_error_status_is_rejection() {
        let http = MockHttpClient::new();
        http.set_response(START_URL, reply(502, "<html>Bad Gateway</html>"));

        let response = launcher(&http).start_job(&JobTarget::new("r")).await.unwrap();
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("Failed to start analysis (HTTP 502)")
        );
    }

    #[tokio::test]
    async fn test_unparseable_success_is_error() {
        let http = MockHttpClient::new();
        http.set_response(START_URL, reply(200, "ok"));

        let err = launcher(&http).start_job(&JobTarget::new("r")).await.unwrap_err();
        assert!(matches!(err, JobStartError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_error() {
        let http = MockHttpClient::new();
        http.set_response(
            START_URL,
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        let err = launcher(&http).start_job(&JobTarget::new("r")).await.unwrap_err();
        assert!(matches!(err, JobStartError::Transport(_)));
    }
}
