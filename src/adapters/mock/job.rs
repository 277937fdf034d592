//! Mock job launcher for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::traits::{HttpError, JobLauncher, JobStartError, JobStartResponse, JobTarget};

#[derive(Debug, Clone)]
enum Outcome {
    Answer(JobStartResponse),
    Unreachable(String),
}

/// Job launcher with a fixed outcome that records every target it was asked
/// to start.
#[derive(Debug, Clone)]
pub struct MockJobLauncher {
    outcome: Outcome,
    calls: Arc<Mutex<Vec<JobTarget>>>,
}

impl MockJobLauncher {
    /// Always start a job with `analysis_id`.
    pub fn started(analysis_id: &str) -> Self {
        Self::with_outcome(Outcome::Answer(JobStartResponse::started(analysis_id)))
    }

    /// Always refuse with `error`.
    pub fn rejected(error: &str) -> Self {
        Self::with_outcome(Outcome::Answer(JobStartResponse::rejected(error)))
    }

    /// Always answer with `response`.
    pub fn responding(response: JobStartResponse) -> Self {
        Self::with_outcome(Outcome::Answer(response))
    }

    /// Always fail to reach the backend.
    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Outcome::Unreachable(message.to_string()))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Targets passed to `start_job`, in call order.
    pub fn calls(&self) -> Vec<JobTarget> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobLauncher for MockJobLauncher {
    async fn start_job(&self, target: &JobTarget) -> Result<JobStartResponse, JobStartError> {
        self.calls.lock().unwrap().push(target.clone());

        match &self.outcome {
            Outcome::Answer(response) => Ok(response.clone()),
            Outcome::Unreachable(message) => Err(JobStartError::Transport(
                HttpError::ConnectionFailed(message.clone()),
            )),
        }
    }
}
