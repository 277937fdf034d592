//! Observable controller state.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use crate::traits::{TaskEntry, TaskUpdate};

/// Controller lifecycle.
///
/// `Idle -> Pending -> Running -> Completed | Failed`. Reconnects keep the
/// status at `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Pending,
    Running,
    Completed,
    Failed,
}

impl ConnectionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionStatus::Completed | ConnectionStatus::Failed)
    }

    /// Pending or running.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionStatus::Pending | ConnectionStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Running => "running",
            ConnectionStatus::Completed => "completed",
            ConnectionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of everything the UI may render for one job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    pub status: ConnectionStatus,
    /// Percent complete from the latest progress frame
    pub progress: f64,
    pub stage: String,
    pub message: String,
    pub vci_score: Option<f64>,
    /// User-facing failure message; only set when `status` is `Failed`
    pub error: Option<String>,
    /// Consecutive retryable failures on the current job
    pub retry_count: u32,
    /// When the next reconnect fires, while waiting for it
    pub retry_at: Option<Instant>,
    pub analysis_id: Option<String>,
    pub commit_sha: Option<String>,
}

impl ProgressState {
    /// Time left until the pending reconnect, or `None` when not waiting.
    pub fn time_until_retry(&self) -> Option<Duration> {
        self.retry_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_reconnecting(&self) -> bool {
        self.retry_at.is_some()
    }

    /// The registry-visible fields that differ from `previous`.
    pub fn changes_since(&self, previous: &ProgressState) -> TaskUpdate {
        TaskUpdate {
            analysis_id: match (&self.analysis_id, &previous.analysis_id) {
                (Some(now), Some(before)) if now == before => None,
                (Some(now), _) => Some(now.clone()),
                _ => None,
            },
            status: (self.status != previous.status).then_some(self.status),
            progress: (self.progress != previous.progress).then_some(self.progress),
            stage: (self.stage != previous.stage).then(|| self.stage.clone()),
            message: (self.message != previous.message).then(|| self.message.clone()),
            error: match (&self.error, &previous.error) {
                (Some(now), Some(before)) if now == before => None,
                (Some(now), _) => Some(now.clone()),
                _ => None,
            },
        }
    }

    /// A registry entry mirroring this state.
    pub fn to_task_entry(&self, id: &str) -> TaskEntry {
        TaskEntry {
            id: id.to_string(),
            analysis_id: self.analysis_id.clone(),
            status: self.status,
            progress: self.progress,
            stage: self.stage.clone(),
            message: self.message.clone(),
            error: self.error.clone(),
            updated_at: chrono::Utc::now(),
        }
    }
}
