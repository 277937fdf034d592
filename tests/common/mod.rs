//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let http = MockHttpClient::new();
//! http.push_response(STREAM_URL, MockResponse::stream_text(&[&progress_frame("running", 40.0)]));
//! let controller = controller_with(&http, &MockJobLauncher::started(ANALYSIS_ID));
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use analysis_progress::adapters::mock::{MockHttpClient, MockJobLauncher};
use analysis_progress::config::ClientConfig;
use analysis_progress::controller::StreamController;

pub const ANALYSIS_ID: &str = "an-42";
pub const STREAM_URL: &str = "http://localhost:8000/api/analyses/an-42/stream";

/// One complete SSE frame carrying a progress update.
pub fn progress_frame(status: &str, progress: f64) -> String {
    let payload = serde_json::json!({
        "analysis_id": ANALYSIS_ID,
        "stage": format!("stage-{}", progress),
        "progress": progress,
        "message": format!("{} at {}", status, progress),
        "status": status,
    });
    format!("data: {}\n\n", payload)
}

/// Controller over the mocks with default configuration.
pub fn controller_with(http: &MockHttpClient, launcher: &MockJobLauncher) -> StreamController {
    controller_with_config(http, launcher, ClientConfig::default())
}

pub fn controller_with_config(
    http: &MockHttpClient,
    launcher: &MockJobLauncher,
    config: ClientConfig,
) -> StreamController {
    StreamController::new(Arc::new(http.clone()), Arc::new(launcher.clone()), config)
}
