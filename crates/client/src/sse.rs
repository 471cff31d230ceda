//! Push transport: server-sent event stream for a single job.
//!
//! Subscribes to `GET /jobs/{id}/events` with a generated client id and
//! incrementally parses `text/event-stream` frames out of the response
//! body. Recognized events are the default/`snapshot` payloads plus the
//! distinguished `complete` and `error` messages. The loop exits on
//! cancellation, stream end, or transport error; fallback-to-polling
//! policy lives in the lifecycle controller, not here.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sitepulse_core::{JobId, JobSnapshot};

use crate::api::AuditApi;
use crate::source::StatusUpdate;

/// Event name for a regular job snapshot frame (also the default when the
/// server omits the `event:` field).
pub const EVENT_SNAPSHOT: &str = "snapshot";
/// Distinguished final frame: the job reached a terminal status.
pub const EVENT_COMPLETE: &str = "complete";
/// Distinguished error frame: the server is tearing the stream down.
pub const EVENT_ERROR: &str = "error";

/// One parsed `text/event-stream` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if present.
    pub event: Option<String>,
    /// Concatenated `data:` lines, newline-joined.
    pub data: String,
}

/// Extract the next complete frame from `buffer`, draining the consumed
/// bytes. Returns `None` until a blank-line frame delimiter has arrived.
///
/// Carriage returns must already be stripped from the buffer. Comment
/// lines (leading `:`) and unknown fields are ignored.
pub fn parse_sse_event(buffer: &mut String) -> Option<SseEvent> {
    let end = buffer.find("\n\n")?;
    let frame: String = buffer.drain(..end + 2).collect();

    let mut event = None;
    let mut data_lines = Vec::new();
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }

    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

/// Read the job's event stream until it ends, errors, or is cancelled.
///
/// Spawned by `JobStatusSource::start`; communicates exclusively through
/// the `tx` channel.
pub(crate) async fn run_subscription(
    api: Arc<AuditApi>,
    job_id: JobId,
    cancel: CancellationToken,
    tx: mpsc::Sender<StatusUpdate>,
) {
    let client_id = uuid::Uuid::new_v4().to_string();
    let url = format!(
        "{}/jobs/{}/events?client_id={}",
        api.base_url(),
        job_id,
        client_id
    );

    let response = match api
        .http_client()
        .get(&url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            let _ = tx
                .send(StatusUpdate::StreamError(format!(
                    "event stream subscription failed: {}",
                    response.status()
                )))
                .await;
            return;
        }
        Err(e) => {
            let _ = tx.send(StatusUpdate::StreamError(e.to_string())).await;
            return;
        }
    };

    tracing::info!(job_id = %job_id, client_id = %client_id, "Subscribed to job event stream");

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Event stream subscription cancelled");
                return;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes).replace('\r', ""));
                    while let Some(event) = parse_sse_event(&mut buffer) {
                        if !dispatch_event(&job_id, event, &tx).await {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(job_id = %job_id, error = %e, "Event stream read error");
                    let _ = tx.send(StatusUpdate::StreamError(e.to_string())).await;
                    return;
                }
                None => {
                    tracing::debug!(job_id = %job_id, "Event stream ended");
                    let _ = tx.send(StatusUpdate::Closed).await;
                    return;
                }
            }
        }
    }
}

/// Forward one frame to the consumer. Returns `false` when the stream
/// should terminate (terminal frame seen or receiver gone).
async fn dispatch_event(job_id: &str, event: SseEvent, tx: &mpsc::Sender<StatusUpdate>) -> bool {
    if event.data.is_empty() && event.event.is_none() {
        // Keep-alive frame.
        return true;
    }

    match event.event.as_deref() {
        Some(EVENT_COMPLETE) => {
            if let Ok(snapshot) = serde_json::from_str::<JobSnapshot>(&event.data) {
                let _ = tx.send(StatusUpdate::Snapshot(snapshot)).await;
            }
            tracing::info!(job_id, "Job event stream reported completion");
            let _ = tx.send(StatusUpdate::Closed).await;
            false
        }
        Some(EVENT_ERROR) => {
            let _ = tx.send(StatusUpdate::StreamError(event.data)).await;
            false
        }
        None | Some(EVENT_SNAPSHOT) => match serde_json::from_str::<JobSnapshot>(&event.data) {
            Ok(snapshot) => tx.send(StatusUpdate::Snapshot(snapshot)).await.is_ok(),
            Err(e) => {
                tracing::warn!(job_id, error = %e, raw = %event.data, "Skipping malformed snapshot frame");
                true
            }
        },
        Some(other) => {
            tracing::trace!(job_id, event = other, "Ignoring unknown stream event");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_event_with_name() {
        let mut buffer = "event: snapshot\ndata: {\"id\":\"j\"}\n\n".to_string();
        let event = parse_sse_event(&mut buffer).unwrap();
        assert_eq!(event.event.as_deref(), Some("snapshot"));
        assert_eq!(event.data, "{\"id\":\"j\"}");
        assert!(buffer.is_empty());
    }

    #[test]
    fn incomplete_frame_yields_nothing() {
        let mut buffer = "data: partial".to_string();
        assert!(parse_sse_event(&mut buffer).is_none());
        assert_eq!(buffer, "data: partial");
    }

    #[test]
    fn multiple_frames_drain_in_order() {
        let mut buffer = "data: one\n\ndata: two\n\n".to_string();
        assert_eq!(parse_sse_event(&mut buffer).unwrap().data, "one");
        assert_eq!(parse_sse_event(&mut buffer).unwrap().data, "two");
        assert!(parse_sse_event(&mut buffer).is_none());
    }

    #[test]
    fn multiline_data_is_newline_joined() {
        let mut buffer = "data: line1\ndata: line2\n\n".to_string();
        assert_eq!(parse_sse_event(&mut buffer).unwrap().data, "line1\nline2");
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let mut buffer = ": keep-alive\nid: 7\ndata: x\n\n".to_string();
        let event = parse_sse_event(&mut buffer).unwrap();
        assert_eq!(event.event, None);
        assert_eq!(event.data, "x");
    }
}
