//! HTTP and streaming plumbing for the SitePulse audit client.
//!
//! This crate turns the backend's job API into one logical stream of
//! [`StatusUpdate`]s:
//!
//! - [`RetryingFetcher`] — bounded linear-capped backoff on rate limits.
//! - [`AuditApi`] — REST client for job fetch/creation and dashboard data.
//! - [`sse`] — push transport reading the job's server-sent event stream.
//! - [`poll`] — pull transport re-fetching the job on a fixed interval.
//! - [`source`] — unified handle over both transports; the lifecycle
//!   controller decides which one runs and when to switch.

pub mod api;
pub mod config;
pub mod error;
pub mod poll;
pub mod retry;
pub mod source;
pub mod sse;

pub use api::{AuditApi, CreateJobRequest, CreateJobResponse};
pub use config::ClientConfig;
pub use error::ClientError;
pub use retry::{RetryConfig, RetryingFetcher};
pub use source::{JobStatusSource, StatusSourceHandle, StatusUpdate, Transport};
