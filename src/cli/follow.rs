//! Follow a running controller until it finishes or the user interrupts.

use std::future::Future;

use crate::controller::{ConnectionStatus, StreamController};

use super::report::progress_line;

/// How following ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Completed,
    Failed,
    /// The interrupt fired; the controller was reset
    Interrupted,
}

impl FollowOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            FollowOutcome::Completed => 0,
            FollowOutcome::Failed => 1,
            FollowOutcome::Interrupted => 130,
        }
    }
}

/// Emit a line for every distinct state until the job is terminal.
///
/// `interrupt` is polled for the whole run, so a signal that arrives while
/// a line is being printed is not lost.
pub async fn follow<I, W>(controller: &StreamController, interrupt: I, mut emit: W) -> FollowOutcome
where
    I: Future,
    W: FnMut(&str),
{
    let mut updates = controller.subscribe();
    tokio::pin!(interrupt);

    let mut last_line = String::new();
    loop {
        let state = updates.borrow_and_update().clone();
        if state.status != ConnectionStatus::Idle {
            let line = progress_line(&state);
            if line != last_line {
                emit(&line);
                last_line = line;
            }
        }
        if state.status.is_terminal() {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut interrupt => {
                controller.reset();
                controller.join().await;
                return FollowOutcome::Interrupted;
            }
        }
    }

    controller.join().await;
    match controller.state().status {
        ConnectionStatus::Failed => FollowOutcome::Failed,
        _ => FollowOutcome::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockJobLauncher, MockResponse};
    use crate::config::ClientConfig;
    use crate::controller::ProgressState;
    use crate::traits::JobTarget;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    const STREAM_URL: &str = "http://localhost:8000/api/analyses/an-1/stream";

    fn controller(http: &MockHttpClient) -> StreamController {
        StreamController::new(
            Arc::new(http.clone()),
            Arc::new(MockJobLauncher::started("an-1")),
            ClientConfig::default(),
        )
    }

    fn frame(status: &str, progress: u32) -> String {
        format!(
            "data: {{\"analysis_id\":\"an-1\",\"stage\":\"scan\",\"progress\":{},\"status\":\"{}\"}}\n\n",
            progress, status
        )
    }

    #[tokio::test]
    async fn test_follow_prints_until_completed() {
        let http = MockHttpClient::new();
        http.push_response(
            STREAM_URL,
            MockResponse::stream_text(&[&frame("running", 50), &frame("completed", 100)]),
        );
        let controller = controller(&http);
        controller.start(JobTarget::new("org/repo"), "t");

        let mut lines = Vec::new();
        let outcome = follow(&controller, std::future::pending::<()>(), |l| {
            lines.push(l.to_string())
        })
        .await;

        assert_eq!(outcome, FollowOutcome::Completed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(lines.last().map(String::as_str), Some("completed"));
    }

    #[tokio::test]
    async fn test_follow_reports_failure() {
        let http = MockHttpClient::new();
        http.push_response(STREAM_URL, MockResponse::status(404));
        let controller = controller(&http);
        controller.start(JobTarget::new("org/repo"), "t");

        let outcome = follow(&controller, std::future::pending::<()>(), |_| {}).await;

        assert_eq!(outcome, FollowOutcome::Failed);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_fired_early_is_not_lost() {
        let http = MockHttpClient::new();
        http.push_response(
            STREAM_URL,
            MockResponse::stream_then_hang(&[&frame("running", 10)]),
        );
        let controller = controller(&http);
        let (tx, rx) = oneshot::channel::<()>();
        // Fires before following even starts.
        tx.send(()).unwrap();
        controller.start(JobTarget::new("org/repo"), "t");

        let outcome = follow(&controller, rx, |_| {}).await;

        assert_eq!(outcome, FollowOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(controller.state(), ProgressState::default());
    }

    #[tokio::test]
    async fn test_interrupt_while_streaming_resets() {
        let http = MockHttpClient::new();
        http.push_response(
            STREAM_URL,
            MockResponse::stream_then_hang(&[&frame("running", 10)]),
        );
        let controller = controller(&http);
        let mut rx_state = controller.subscribe();
        let (tx, rx) = oneshot::channel::<()>();
        controller.start(JobTarget::new("org/repo"), "t");

        let trigger = async {
            rx_state.wait_for(|s| s.progress == 10.0).await.unwrap();
            tx.send(()).unwrap();
        };
        let (outcome, ()) = tokio::join!(follow(&controller, rx, |_| {}), trigger);

        assert_eq!(outcome, FollowOutcome::Interrupted);
        assert!(!controller.is_active());
    }
}
