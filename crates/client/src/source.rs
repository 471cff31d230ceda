//! Unified job status source over the push and pull transports.
//!
//! [`JobStatusSource::start`] spawns exactly one transport task and hands
//! back a [`StatusSourceHandle`]. The handle is the single ownership point
//! for the task: stopping it (or dropping it) cancels the underlying SSE
//! read loop or polling interval. The lifecycle controller guarantees at
//! most one live handle per job id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sitepulse_core::{JobId, JobSnapshot};

use crate::api::AuditApi;
use crate::{poll, sse};

/// Buffer size for transport → controller delivery.
pub(crate) const CHANNEL_CAPACITY: usize = 32;

/// Which transport a status source runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Server-sent events; preferred while the job is actively running.
    Push,
    /// Interval polling; fallback and default for inactive jobs.
    Pull,
}

/// One message from a status source to its consumer.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    /// A job state observation from either transport.
    Snapshot(JobSnapshot),
    /// The push stream broke. The consumer decides the fallback policy;
    /// the transport does not re-poll on its own.
    StreamError(String),
    /// A poll fetch failed. The consumer keeps its last-known-good state;
    /// the poll loop keeps ticking.
    FetchFailed(String),
    /// The source finished cleanly (terminal status seen or stream ended).
    Closed,
}

/// Factory for status source tasks.
pub struct JobStatusSource;

impl JobStatusSource {
    /// Spawn a status source for `job_id` on the chosen transport.
    ///
    /// The spawned task is cancelled through a child of `parent`, so
    /// tearing down the owning view cancels every source it started.
    pub fn start(
        api: Arc<AuditApi>,
        job_id: JobId,
        transport: Transport,
        poll_interval: Duration,
        parent: &CancellationToken,
    ) -> StatusSourceHandle {
        let cancel = parent.child_token();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        match transport {
            Transport::Push => {
                tokio::spawn(sse::run_subscription(
                    api,
                    job_id.clone(),
                    cancel.clone(),
                    tx,
                ));
            }
            Transport::Pull => {
                tokio::spawn(poll::run_poll_loop(
                    api,
                    job_id.clone(),
                    poll_interval,
                    cancel.clone(),
                    tx,
                ));
            }
        }

        tracing::debug!(job_id = %job_id, ?transport, "Status source started");

        StatusSourceHandle {
            job_id,
            transport,
            receiver: rx,
            cancel,
        }
    }
}

/// Owning handle for one running status source task.
///
/// Dropping the handle cancels the task, so a source can never outlive the
/// view that started it.
pub struct StatusSourceHandle {
    job_id: JobId,
    transport: Transport,
    receiver: mpsc::Receiver<StatusUpdate>,
    cancel: CancellationToken,
}

impl StatusSourceHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Receive the next update; `None` once the source task has finished
    /// and drained.
    pub async fn recv(&mut self) -> Option<StatusUpdate> {
        self.receiver.recv().await
    }

    /// Stop the source task. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for StatusSourceHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
