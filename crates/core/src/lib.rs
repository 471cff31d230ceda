//! Shared domain types for the SitePulse audit client.
//!
//! This crate defines the client-side mirror of a backend audit job:
//!
//! - [`Job`] — the eventually-consistent local mirror of one audit job.
//! - [`JobSnapshot`] — one observation of job state received from either
//!   transport (push stream or poll), merged via [`merge_snapshot`].
//! - [`TabKind`] — the dependent dashboard sub-tabs fed by a finished job.

pub mod job;
pub mod tab;
pub mod types;

pub use job::{merge_snapshot, Job, JobSnapshot, JobStatus, MergeOutcome};
pub use tab::TabKind;
pub use types::{JobId, Timestamp};
