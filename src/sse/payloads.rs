//! Event payload decoding
//!
//! Two independent steps: [`decode`] turns an event's `data` into JSON (or
//! `None`), and [`is_progress_update`] checks the decoded value's shape. The
//! classifier works on any `serde_json::Value`, whatever its origin.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::SseEvent;

/// Maximum characters of payload included in decode diagnostics.
const PREVIEW_CHARS: usize = 100;

/// Lifecycle status reported by the backend for an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Any status this client does not know; treated as still in progress
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    /// Parse a wire status. Unrecognised values map to `Unknown`.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "pending" => AnalysisStatus::Pending,
            "running" => AnalysisStatus::Running,
            "completed" => AnalysisStatus::Completed,
            "failed" => AnalysisStatus::Failed,
            _ => AnalysisStatus::Unknown,
        }
    }

    /// Completed and failed end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Unknown => "unknown",
        }
    }
}

/// Progress frame payload sent on the analysis event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub analysis_id: String,
    pub stage: String,
    /// Percent complete, 0 to 100
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vci_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl ProgressUpdate {
    /// Build an update from a value that passed [`is_progress_update`].
    ///
    /// Optional fields with the wrong type are treated as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let opt_str = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            analysis_id: obj.get("analysis_id")?.as_str()?.to_string(),
            stage: obj.get("stage")?.as_str()?.to_string(),
            progress: obj.get("progress")?.as_f64()?,
            message: opt_str("message"),
            status: AnalysisStatus::from_wire(obj.get("status")?.as_str()?),
            vci_score: obj.get("vci_score").and_then(Value::as_f64),
            commit_sha: opt_str("commit_sha"),
        })
    }
}

/// Options for [`decode`].
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions<'a> {
    /// Emit a warning when the payload is not valid JSON
    pub log_errors: bool,
    /// Prefix for the warning, rendered as `[context]`
    pub context: Option<&'a str>,
}

impl<'a> DecodeOptions<'a> {
    /// Options that log failures under the given context.
    pub fn logged(context: &'a str) -> Self {
        Self {
            log_errors: true,
            context: Some(context),
        }
    }
}

/// Decode an event's data as JSON, returning `None` on any failure.
///
/// Logging never changes the result.
pub fn decode<T: DeserializeOwned>(event: &SseEvent, opts: &DecodeOptions<'_>) -> Option<T> {
    match serde_json::from_str::<T>(&event.data) {
        Ok(value) => Some(value),
        Err(e) => {
            if opts.log_errors {
                let preview = preview(&event.data);
                match opts.context {
                    Some(ctx) => tracing::warn!(
                        "[{}] Failed to decode {} event payload: {} (data: {})",
                        ctx,
                        event.event_type,
                        e,
                        preview
                    ),
                    None => tracing::warn!(
                        "Failed to decode {} event payload: {} (data: {})",
                        event.event_type,
                        e,
                        preview
                    ),
                }
            }
            None
        }
    }
}

/// Check that a value has the progress update shape.
///
/// `analysis_id`, `stage` and `status` must be strings and `progress` a
/// number. Optional fields are not inspected.
pub fn is_progress_update(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let is_str = |key: &str| obj.get(key).is_some_and(Value::is_string);

    is_str("analysis_id")
        && is_str("stage")
        && is_str("status")
        && obj.get("progress").is_some_and(Value::is_number)
}

/// Decode and classify in one step.
///
/// Returns `None` for malformed JSON or the wrong shape. Anything that
/// passes [`is_progress_update`] yields an update.
pub fn decode_progress(event: &SseEvent, opts: &DecodeOptions<'_>) -> Option<ProgressUpdate> {
    let value: Value = decode(event, opts)?;
    if !is_progress_update(&value) {
        return None;
    }
    ProgressUpdate::from_value(&value)
}

fn preview(data: &str) -> String {
    match data.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &data[..idx]),
        None => data.to_string(),
    }
}
