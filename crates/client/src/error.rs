use thiserror::Error;

/// Errors surfaced by the HTTP layer.
///
/// Push-stream failures travel as `StatusUpdate::StreamError` rather than
/// as an error: the consumer treats them as a transport downgrade, not a
/// failure of the operation it asked for. Stale snapshots are not
/// represented either; discarding them is a silent no-op handled by the
/// merge in `sitepulse-core`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend kept answering 429 until retry attempts ran out.
    #[error("rate limited after exhausting retry attempts")]
    RateLimited,

    /// The backend returned a non-2xx, non-429 status. Not retried.
    #[error("request failed with status {status}")]
    RequestFailed { status: u16 },

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),
}
