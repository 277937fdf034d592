//! Stream connection controller.
//!
//! Drives one analysis job from trigger to terminal outcome:
//!
//! 1. `Pending`: ask the [`JobLauncher`] to start the job. Failure here is
//!    final; nothing is retried.
//! 2. `Running`: open the event stream, feed chunks through the SSE parser,
//!    apply each progress frame as it arrives.
//! 3. A `completed` or `failed` frame ends the job. A connection failure is
//!    classified: fatal failures end the job after one attempt, retryable
//!    ones wait out the backoff delay and reconnect, up to
//!    [`RetryPolicy::max_retries`] consecutive times.
//!
//! Every suspension point (job start, stream open, chunk read, backoff wait)
//! is raced against a [`CancellationToken`]. Cancellation stops the job
//! without touching `error` or `status`.

mod retry;
mod state;

pub use retry::RetryPolicy;
pub use state::{ConnectionStatus, ProgressState};

use futures_util::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{FailureClass, StreamFailure};
use crate::sse::{decode_progress, AnalysisStatus, DecodeOptions, ProgressUpdate, SseParser};
use crate::traits::{HttpClient, JobLauncher, JobStartResponse, JobTarget, ProgressSink};

/// Shown when job start fails without a reason from the backend.
pub const JOB_START_FAILED: &str = "Failed to start analysis";
/// Shown when the job-start request never got an answer.
pub const JOB_START_UNREACHABLE: &str = "Failed to start analysis: could not reach the server";
/// Shown after the retry budget is spent.
pub const RETRIES_EXHAUSTED: &str =
    "Lost connection to the analysis stream. Check the analysis status or retry manually.";
/// Shown on a `failed` frame without a message.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

/// Context label for payload decode diagnostics.
const DECODE_CONTEXT: &str = "progress-stream";

/// The in-flight job, if any.
struct ActiveRun {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Everything a run needs, cheap to clone into a spawned task.
#[derive(Clone)]
struct Shared {
    http: Arc<dyn HttpClient>,
    launcher: Arc<dyn JobLauncher>,
    sink: Option<Arc<dyn ProgressSink>>,
    config: ClientConfig,
    state_tx: Arc<watch::Sender<ProgressState>>,
    /// Bumped whenever a run is superseded; stale runs stop writing state.
    generation: Arc<AtomicU64>,
}

/// Starts analysis jobs and follows their progress stream.
///
/// At most one stream is open per controller. Starting a new job, calling
/// [`reset`](Self::reset), or dropping the controller cancels the previous
/// one first.
///
/// # Example
///
/// ```ignore
/// let controller = StreamController::new(http, launcher, ClientConfig::from_env()?)
///     .with_sink(registry.clone());
/// controller.start(JobTarget::new("org/repo"), "task-1");
///
/// let mut updates = controller.subscribe();
/// while updates.changed().await.is_ok() {
///     let state = updates.borrow().clone();
///     println!("{} {:.0}%", state.stage, state.progress);
///     if state.status.is_terminal() {
///         break;
///     }
/// }
/// ```
pub struct StreamController {
    shared: Shared,
    active: Mutex<Option<ActiveRun>>,
}

impl StreamController {
    pub fn new(
        http: Arc<dyn HttpClient>,
        launcher: Arc<dyn JobLauncher>,
        config: ClientConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(ProgressState::default());
        Self {
            shared: Shared {
                http,
                launcher,
                sink: None,
                config,
                state_tx: Arc::new(state_tx),
                generation: Arc::new(AtomicU64::new(0)),
            },
            active: Mutex::new(None),
        }
    }

    /// Mirror state changes into `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.shared.sink = Some(sink);
        self
    }

    /// Current state snapshot.
    pub fn state(&self) -> ProgressState {
        self.shared.state_tx.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.shared.state_tx.subscribe()
    }

    /// Start a job in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, target: JobTarget, task_id: impl Into<String>) {
        let cancel = CancellationToken::new();
        let run = self.begin_run(task_id.into(), cancel.clone());

        let handle = tokio::spawn(async move {
            run.execute(target).await;
        });

        *self.active() = Some(ActiveRun {
            cancel,
            handle: Some(handle),
        });
    }

    /// Run a job on the current task until it reaches a terminal state or
    /// `cancel` fires, then return the final state.
    pub async fn run(
        &self,
        target: JobTarget,
        task_id: impl Into<String>,
        cancel: CancellationToken,
    ) -> ProgressState {
        let run = self.begin_run(task_id.into(), cancel.clone());
        *self.active() = Some(ActiveRun {
            cancel,
            handle: None,
        });

        run.execute(target).await;
        self.state()
    }

    /// Wait for the background job started by [`start`](Self::start).
    pub async fn join(&self) {
        let handle = self.active().as_mut().and_then(|run| run.handle.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Stream task ended abnormally: {}", e);
            }
        }
    }

    /// Cancel any in-flight job and return to the initial idle state.
    ///
    /// Safe to call at any time, any number of times.
    pub fn reset(&self) {
        self.cancel_active();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.state_tx.send_replace(ProgressState::default());
    }

    /// True while a job is pending or running.
    pub fn is_active(&self) -> bool {
        self.shared.state_tx.borrow().status.is_active()
    }

    fn begin_run(&self, task_id: String, cancel: CancellationToken) -> Run {
        self.cancel_active();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Run {
            shared: self.shared.clone(),
            task_id,
            generation,
            cancel,
        }
    }

    /// Cancel the in-flight run but keep its handle so `join` can await it.
    fn cancel_active(&self) {
        if let Some(run) = self.active().as_ref() {
            if !run.cancel.is_cancelled() {
                debug!("Cancelling active stream");
                run.cancel.cancel();
            }
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

/// One job attempt. Owns its cancellation token and only writes state while
/// it is the controller's current generation.
struct Run {
    shared: Shared,
    task_id: String,
    generation: u64,
    cancel: CancellationToken,
}

impl Run {
    async fn execute(&self, target: JobTarget) {
        self.begin();

        let analysis_id = match self.start_job(&target).await {
            Some(id) => id,
            None => return,
        };

        info!(analysis_id = %analysis_id, task_id = %self.task_id, "Analysis started");
        self.update(|s| {
            s.status = ConnectionStatus::Running;
            s.analysis_id = Some(analysis_id.clone());
        });

        self.follow(&analysis_id).await;
    }

    /// Trigger the job. `None` means the run is over (failed or cancelled).
    async fn start_job(&self, target: &JobTarget) -> Option<String> {
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!("Cancelled before the job started");
                return None;
            }
            result = self.shared.launcher.start_job(target) => result,
        };

        match result {
            Ok(JobStartResponse {
                success: true,
                analysis_id: Some(id),
                ..
            }) => Some(id),
            Ok(response) => {
                let message = response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| JOB_START_FAILED.to_string());
                warn!(repository = %target.repository, "Job start rejected: {}", message);
                self.fail(message);
                None
            }
            Err(e) => {
                warn!(repository = %target.repository, "Job start request failed: {}", e);
                self.fail(JOB_START_UNREACHABLE.to_string());
                None
            }
        }
    }

    /// Stream until a terminal frame, a fatal failure, exhausted retries, or
    /// cancellation.
    async fn follow(&self, analysis_id: &str) {
        let policy = &self.shared.config.retry;
        let mut failures: u32 = 0;

        loop {
            let failure = match self.stream_once(analysis_id, &mut failures).await {
                Ok(()) => return,
                Err(failure) => failure,
            };

            match failure.class() {
                FailureClass::Cancelled => {
                    debug!(analysis_id, "Stream cancelled");
                    return;
                }
                FailureClass::Fatal => {
                    warn!(
                        analysis_id,
                        code = failure.error_code(),
                        "Stream failed permanently: {}",
                        failure
                    );
                    self.fail(failure.user_message());
                    return;
                }
                FailureClass::Retryable => {
                    if failures >= policy.max_retries {
                        error!(
                            analysis_id,
                            attempts = failures,
                            "Giving up on stream: {}",
                            failure
                        );
                        self.fail(RETRIES_EXHAUSTED.to_string());
                        return;
                    }

                    let delay = policy.delay_for(failures);
                    failures += 1;
                    let retry_at = Instant::now() + delay;
                    warn!(
                        analysis_id,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        "Stream interrupted, reconnecting: {}",
                        failure
                    );
                    self.update(|s| {
                        s.retry_count = failures;
                        s.retry_at = Some(retry_at);
                        s.message = format!(
                            "Connection lost. Reconnecting (attempt {}/{})...",
                            failures, policy.max_retries
                        );
                    });

                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => {
                            debug!(analysis_id, "Cancelled during backoff");
                            return;
                        }
                        () = tokio::time::sleep_until(retry_at) => {}
                    }

                    self.update(|s| s.retry_at = None);
                }
            }
        }
    }

    /// One connection. `Ok` once a terminal frame was applied.
    async fn stream_once(&self, analysis_id: &str, failures: &mut u32) -> Result<(), StreamFailure> {
        let url = self.shared.config.stream_url(analysis_id);
        let headers = self.shared.config.stream_headers();

        let mut body = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(StreamFailure::Cancelled),
            result = self.shared.http.get_stream(&url, &headers) => {
                result.map_err(StreamFailure::from_open_error)?
            }
        };
        debug!(analysis_id, "Progress stream connected");

        let mut parser = SseParser::new();
        let opts = DecodeOptions::logged(DECODE_CONTEXT);

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(StreamFailure::Cancelled),
                next = body.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(StreamFailure::from_read_error(e)),
                None => return Err(StreamFailure::EndedEarly),
            };

            for event in parser.feed_bytes(&chunk) {
                let Some(update) = decode_progress(&event, &opts) else {
                    continue;
                };
                // A frame got through, so the connection is healthy again.
                *failures = 0;
                if self.apply(update) {
                    return Ok(());
                }
            }
        }
    }

    /// Apply one progress frame. Returns true when it was terminal.
    fn apply(&self, update: ProgressUpdate) -> bool {
        let terminal = update.status.is_terminal();
        debug!(
            analysis_id = %update.analysis_id,
            status = update.status.as_str(),
            progress = update.progress,
            "Progress update"
        );

        self.update(|s| {
            s.progress = update.progress;
            s.stage = update.stage.clone();
            s.message = update.message.clone().unwrap_or_default();
            s.retry_count = 0;
            s.retry_at = None;
            if update.vci_score.is_some() {
                s.vci_score = update.vci_score;
            }
            if update.commit_sha.is_some() {
                s.commit_sha = update.commit_sha.clone();
            }
            match update.status {
                AnalysisStatus::Pending | AnalysisStatus::Running | AnalysisStatus::Unknown => {
                    s.status = ConnectionStatus::Running;
                }
                AnalysisStatus::Completed => {
                    s.status = ConnectionStatus::Completed;
                }
                AnalysisStatus::Failed => {
                    s.status = ConnectionStatus::Failed;
                    s.error = Some(
                        update
                            .message
                            .clone()
                            .filter(|m| !m.trim().is_empty())
                            .unwrap_or_else(|| ANALYSIS_FAILED.to_string()),
                    );
                }
            }
        });

        if terminal {
            info!(
                analysis_id = %update.analysis_id,
                status = update.status.as_str(),
                "Analysis finished"
            );
        }
        terminal
    }

    fn is_current(&self) -> bool {
        self.shared.generation.load(Ordering::SeqCst) == self.generation
    }

    /// Reset state to `Pending` and register the task.
    fn begin(&self) {
        let mut entry = None;
        self.shared.state_tx.send_if_modified(|state| {
            if !self.is_current() {
                return false;
            }
            *state = ProgressState {
                status: ConnectionStatus::Pending,
                ..Default::default()
            };
            entry = Some(state.to_task_entry(&self.task_id));
            true
        });

        // The sink runs outside the watch lock so it may read controller state.
        if let (Some(sink), Some(entry)) = (&self.shared.sink, entry) {
            sink.add_task(entry);
        }
    }

    /// Mutate state and mirror the change. A superseded run writes nothing.
    fn update(&self, f: impl FnOnce(&mut ProgressState)) {
        let mut changes = None;
        self.shared.state_tx.send_if_modified(|state| {
            if !self.is_current() {
                return false;
            }
            let before = state.clone();
            f(state);
            changes = Some(state.changes_since(&before));
            *state != before
        });

        if let (Some(sink), Some(changes)) = (&self.shared.sink, changes) {
            if !changes.is_empty() {
                sink.update_task(&self.task_id, changes);
            }
        }
    }

    fn fail(&self, message: String) {
        self.update(|s| {
            s.status = ConnectionStatus::Failed;
            s.error = Some(message);
            s.retry_at = None;
        });
    }
}
