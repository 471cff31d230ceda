//! Pull transport: fixed-interval re-fetch of the job resource.
//!
//! The default when the push stream is unavailable or the job is not in an
//! active state. Re-fetches through the retrying fetcher (so 429 backoff
//! applies), stops as soon as a fetched snapshot carries a terminal
//! status, and stops immediately on cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sitepulse_core::{JobId, JobStatus};

use crate::api::AuditApi;
use crate::source::StatusUpdate;

/// Default re-fetch interval for the pull transport.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll the job resource until terminal status or cancellation.
///
/// The first tick fires immediately, so consumers get an initial snapshot
/// without waiting a full interval. Fetch failures are reported as
/// [`StatusUpdate::FetchFailed`] and the loop keeps ticking — the consumer
/// holds on to its last-known-good state.
pub(crate) async fn run_poll_loop(
    api: Arc<AuditApi>,
    job_id: JobId,
    interval: Duration,
    cancel: CancellationToken,
    tx: mpsc::Sender<StatusUpdate>,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                match api.get_job(&job_id).await {
                    Ok(snapshot) => {
                        let terminal = snapshot
                            .status
                            .map(JobStatus::is_terminal)
                            .unwrap_or(false);

                        if tx.send(StatusUpdate::Snapshot(snapshot)).await.is_err() {
                            return;
                        }
                        if terminal {
                            tracing::debug!(job_id = %job_id, "Terminal status fetched, stopping poll loop");
                            let _ = tx.send(StatusUpdate::Closed).await;
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(job_id = %job_id, error = %e, "Job status poll failed");
                        if tx.send(StatusUpdate::FetchFailed(e.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::source::{JobStatusSource, Transport};

    #[tokio::test]
    async fn stops_after_terminal_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-1",
                "status": "completed",
                "progress": 100,
            })))
            .mount(&server)
            .await;

        let api = Arc::new(AuditApi::new(server.uri()));
        let cancel = CancellationToken::new();
        let mut handle = JobStatusSource::start(
            api,
            "job-1".into(),
            Transport::Pull,
            Duration::from_millis(5),
            &cancel,
        );

        let first = handle.recv().await.unwrap();
        assert_matches!(first, StatusUpdate::Snapshot(ref s) if s.status == Some(JobStatus::Completed));
        assert_matches!(handle.recv().await.unwrap(), StatusUpdate::Closed);
        // The loop exited: channel closes instead of delivering more ticks.
        assert!(handle.recv().await.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_reports_and_keeps_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/job-2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = Arc::new(AuditApi::new(server.uri()));
        let cancel = CancellationToken::new();
        let mut handle = JobStatusSource::start(
            api,
            "job-2".into(),
            Transport::Pull,
            Duration::from_millis(5),
            &cancel,
        );

        assert_matches!(handle.recv().await.unwrap(), StatusUpdate::FetchFailed(_));
        // Still alive: the next tick reports again.
        assert_matches!(handle.recv().await.unwrap(), StatusUpdate::FetchFailed(_));

        handle.stop();
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "job-3",
                "status": "running",
                "progress": 10,
            })))
            .mount(&server)
            .await;

        let api = Arc::new(AuditApi::new(server.uri()));
        let cancel = CancellationToken::new();
        let mut handle = JobStatusSource::start(
            api,
            "job-3".into(),
            Transport::Pull,
            Duration::from_millis(5),
            &cancel,
        );

        assert_matches!(handle.recv().await.unwrap(), StatusUpdate::Snapshot(_));
        handle.stop();
        // After cancellation the task exits; the channel drains to None.
        while let Some(_update) = handle.recv().await {}
    }
}
