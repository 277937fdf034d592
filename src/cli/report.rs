//! One-line progress reports for the terminal.

use std::time::Duration;

use crate::controller::{ConnectionStatus, ProgressState};

/// Render `state` as a single line.
pub fn progress_line(state: &ProgressState) -> String {
    match state.status {
        ConnectionStatus::Idle => "idle".to_string(),
        ConnectionStatus::Pending => "starting analysis...".to_string(),
        ConnectionStatus::Running => {
            if let Some(wait) = state.time_until_retry() {
                return format!("{} (retrying in {})", state.message, seconds(wait));
            }
            let mut line = format!("[{:>5.1}%]", state.progress);
            if !state.stage.is_empty() {
                line.push(' ');
                line.push_str(&state.stage);
            }
            if !state.message.is_empty() {
                line.push_str(": ");
                line.push_str(&state.message);
            }
            line
        }
        ConnectionStatus::Completed => match state.vci_score {
            Some(score) => format!("completed, VCI score {:.1}", score),
            None => "completed".to_string(),
        },
        ConnectionStatus::Failed => format!(
            "failed: {}",
            state.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn seconds(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}
