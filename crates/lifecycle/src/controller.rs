//! The job-view lifecycle controller.
//!
//! Owns the mirrored [`Job`], the view state machine, and the single
//! active status source. View re-renders may ask it to (re)initialize for
//! the same job id any number of times; the in-flight-guard discipline in
//! [`LifecycleController::ensure_source`] makes that safe.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sitepulse_client::{
    AuditApi, JobStatusSource, StatusSourceHandle, StatusUpdate, Transport,
};
use sitepulse_core::{merge_snapshot, Job, JobId, JobSnapshot, JobStatus, MergeOutcome};
use sitepulse_warmup::WarmupCache;

use crate::policy::select_transport;

/// View state of the job dashboard.
///
/// `Configuring` shows the pre-job dialogue; `Running` the live progress
/// view; `Completed`/`Failed` are terminal for this controller — no
/// transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Configuring,
    Running,
    Completed,
    Failed,
}

impl ViewState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ViewState::Completed | ViewState::Failed)
    }
}

/// Orchestrates one job view: status sources, view transitions, warm-up.
pub struct LifecycleController {
    api: Arc<AuditApi>,
    warmup: Arc<WarmupCache>,
    poll_interval: Duration,
    job: Option<Job>,
    view: ViewState,
    active_source: Option<StatusSourceHandle>,
    /// Root token for everything this controller spawns. Cancelled on
    /// shutdown/drop so no source outlives the owning view.
    cancel: CancellationToken,
}

impl LifecycleController {
    pub fn new(api: Arc<AuditApi>, warmup: Arc<WarmupCache>, poll_interval: Duration) -> Self {
        Self {
            api,
            warmup,
            poll_interval,
            job: None,
            view: ViewState::Configuring,
            active_source: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    /// The mirrored job, if any snapshot (or dialogue completion) has
    /// established one. Kept as last-known-good across fetch failures.
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Job id of the currently running status source, if one is active.
    pub fn active_source_job(&self) -> Option<&str> {
        self.active_source.as_ref().map(|h| h.job_id())
    }

    /// Transport of the currently running status source.
    pub fn active_transport(&self) -> Option<Transport> {
        self.active_source.as_ref().map(|h| h.transport())
    }

    /// Enter the view for a job as fetched on page load (or `None` when
    /// no job exists yet and the dialogue should run).
    pub async fn initialize(&mut self, snapshot: Option<JobSnapshot>) {
        let Some(snapshot) = snapshot else {
            self.view = ViewState::Configuring;
            return;
        };

        let job = Job::from_snapshot(snapshot);
        let job_id = job.id.clone();
        let status = job.status;
        let progress = job.progress;
        self.job = Some(job);

        match status {
            JobStatus::Completed => self.enter_completed().await,
            JobStatus::Failed => self.enter_failed(),
            JobStatus::Pending if progress == 0 => {
                // Job row exists but nothing has happened and the dialogue
                // has not reported completion: still configuring.
                self.view = ViewState::Configuring;
            }
            _ => {
                self.view = ViewState::Running;
                let transport = self
                    .job
                    .as_ref()
                    .map(select_transport)
                    .unwrap_or(Transport::Pull);
                self.ensure_source(&job_id, transport);
            }
        }
    }

    /// The configuration dialogue finished and created `job_id`.
    ///
    /// Enters `Running` optimistically, before the first snapshot
    /// confirms it, and starts the status source on push — the job was
    /// just created, so the pipeline is actively working it.
    pub fn on_dialogue_complete(&mut self, job_id: JobId) {
        tracing::info!(job_id = %job_id, "Dialogue complete, entering running view");
        if self.job.as_ref().map(|j| j.id.as_str()) != Some(job_id.as_str()) {
            self.job = Some(Job::new(job_id.clone()));
        }
        self.view = ViewState::Running;
        self.ensure_source(&job_id, Transport::Push);
    }

    /// Receive the next update from the active source, `None` when no
    /// source is active or the source has finished and drained.
    pub async fn next_update(&mut self) -> Option<StatusUpdate> {
        match self.active_source.as_mut() {
            Some(handle) => handle.recv().await,
            None => None,
        }
    }

    /// Drive one step of the update loop. Returns `false` once the
    /// active source is exhausted.
    pub async fn pump(&mut self) -> bool {
        match self.next_update().await {
            Some(update) => {
                self.apply_update(update).await;
                true
            }
            None => {
                self.active_source = None;
                false
            }
        }
    }

    /// Apply one status update to the view.
    pub async fn apply_update(&mut self, update: StatusUpdate) {
        match update {
            StatusUpdate::Snapshot(snapshot) => self.apply_snapshot(snapshot).await,
            StatusUpdate::StreamError(msg) => {
                tracing::warn!(error = %msg, "Push stream failed, falling back to polling");
                if self.view == ViewState::Running {
                    if let Some(job_id) = self.job.as_ref().map(|j| j.id.clone()) {
                        self.stop_source();
                        self.start_source(job_id, Transport::Pull);
                    }
                }
            }
            StatusUpdate::FetchFailed(msg) => {
                // Degrade to "last known state, possibly stale" — never
                // clear the mirror or tear down the lifecycle.
                tracing::warn!(error = %msg, "Status fetch failed, keeping last known job state");
            }
            StatusUpdate::Closed => {
                tracing::debug!("Status source closed");
            }
        }
    }

    /// Tear down everything this controller started. No state updates
    /// can occur afterwards.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.active_source = None;
    }

    // ---- private helpers ----

    async fn apply_snapshot(&mut self, snapshot: JobSnapshot) {
        match self.job.as_mut() {
            Some(job) => {
                if merge_snapshot(job, &snapshot) == MergeOutcome::StaleDiscarded {
                    return;
                }
            }
            None => self.job = Some(Job::from_snapshot(snapshot)),
        }

        if self.view.is_terminal() {
            // Terminal view states never transition back; the merge above
            // already rejected regressing snapshots.
            return;
        }

        let (status, progress) = match self.job.as_ref() {
            Some(job) => (job.status, job.progress),
            None => return,
        };

        match status {
            JobStatus::Completed => self.enter_completed().await,
            JobStatus::Failed => self.enter_failed(),
            JobStatus::Running => {
                if self.view == ViewState::Configuring {
                    self.view = ViewState::Running;
                }
            }
            JobStatus::Pending => {
                if self.view == ViewState::Configuring && progress > 0 {
                    self.view = ViewState::Running;
                }
            }
        }
    }

    /// Start a source for `job_id` unless one is already running for it.
    /// A source for a different job id is stopped and replaced.
    fn ensure_source(&mut self, job_id: &str, transport: Transport) {
        if let Some(handle) = &self.active_source {
            if handle.job_id() == job_id {
                tracing::debug!(job_id, "Status source already running");
                return;
            }
            handle.stop();
        }
        self.start_source(job_id.to_string(), transport);
    }

    fn start_source(&mut self, job_id: JobId, transport: Transport) {
        let handle = JobStatusSource::start(
            Arc::clone(&self.api),
            job_id,
            transport,
            self.poll_interval,
            &self.cancel,
        );
        tracing::info!(job_id = %handle.job_id(), ?transport, "Job status source active");
        self.active_source = Some(handle);
    }

    fn stop_source(&mut self) {
        if let Some(handle) = self.active_source.take() {
            handle.stop();
        }
    }

    async fn enter_completed(&mut self) {
        self.view = ViewState::Completed;
        self.stop_source();
        if let Some(job_id) = self.job.as_ref().map(|j| j.id.clone()) {
            tracing::info!(job_id = %job_id, "Job completed, warming dependent dashboards");
            self.warmup.warm_dependents(&job_id).await;
        }
    }

    fn enter_failed(&mut self) {
        self.view = ViewState::Failed;
        self.stop_source();
        if let Some(job) = &self.job {
            tracing::warn!(
                job_id = %job.id,
                error = job.error_message.as_deref().unwrap_or("unknown"),
                "Job failed",
            );
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
