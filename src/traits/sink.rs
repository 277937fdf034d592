//! Task registry port.
//!
//! The controller mirrors its state into a registry that other screens read.
//! From the controller's side the registry is write-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::ConnectionStatus;

/// A task as first registered by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    pub analysis_id: Option<String>,
    pub status: ConnectionStatus,
    pub progress: f64,
    pub stage: String,
    pub message: String,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TaskEntry {
    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(ref analysis_id) = update.analysis_id {
            self.analysis_id = Some(analysis_id.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(ref stage) = update.stage {
            self.stage = stage.clone();
        }
        if let Some(ref message) = update.message {
            self.message = message.clone();
        }
        if let Some(ref error) = update.error {
            self.error = Some(error.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// Fields that changed; `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub analysis_id: Option<String>,
    pub status: Option<ConnectionStatus>,
    pub progress: Option<f64>,
    pub stage: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.analysis_id.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.stage.is_none()
            && self.message.is_none()
            && self.error.is_none()
    }
}

/// Narrow write interface onto an external task registry.
pub trait ProgressSink: Send + Sync {
    /// Register a task. Replaces an existing entry with the same id.
    fn add_task(&self, task: TaskEntry);

    /// Merge `update` into the task `id`. Unknown ids are ignored.
    fn update_task(&self, id: &str, update: TaskUpdate);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> TaskEntry {
        TaskEntry {
            id: "task-1".to_string(),
            analysis_id: Some("an-1".to_string()),
            status: ConnectionStatus::Pending,
            progress: 0.0,
            stage: String::new(),
            message: String::new(),
            error: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut task = entry();
        task.apply(&TaskUpdate {
            progress: Some(40.0),
            stage: Some("scanning".to_string()),
            ..Default::default()
        });

        assert_eq!(task.progress, 40.0);
        assert_eq!(task.stage, "scanning");
        assert_eq!(task.status, ConnectionStatus::Pending);
        assert_eq!(task.message, "");
    }

    #[test]
    fn test_apply_sets_analysis_id() {
        let mut task = entry();
        task.analysis_id = None;
        task.apply(&TaskUpdate {
            analysis_id: Some("an-2".to_string()),
            ..Default::default()
        });
        assert_eq!(task.analysis_id.as_deref(), Some("an-2"));
    }

    #[test]
    fn test_task_update_is_empty() {
        assert!(TaskUpdate::default().is_empty());
        assert!(!TaskUpdate {
            status: Some(ConnectionStatus::Failed),
            ..Default::default()
        }
        .is_empty());
    }
}
