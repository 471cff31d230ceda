//! Client-side mirror of a backend audit job.
//!
//! The backend owns the job; the client only holds an eventually-consistent
//! [`Job`] mirror and mutates it by merging incoming [`JobSnapshot`]s.
//! [`merge_snapshot`] is idempotent and rejects snapshots that would move
//! the mirror backwards, so a late-arriving stale poll response cannot
//! regress state already applied from the push stream.

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

/// Lifecycle status of an audit job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created but not yet picked up by the audit pipeline.
    Pending,
    /// The audit pipeline is working on the job.
    Running,
    /// The job finished successfully. Terminal.
    Completed,
    /// The job finished with an error. Terminal.
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Ordering rank used for stale-snapshot rejection.
    ///
    /// Both terminal statuses share the top rank: the backend never moves
    /// between them, and neither may be overwritten by a non-terminal
    /// status.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

/// The mirrored state of one audit job.
///
/// Mutated only through [`merge_snapshot`] — the client never computes
/// job fields itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Completion percentage (0..=100).
    pub progress: u8,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
}

impl Job {
    /// A fresh mirror for a job known only by id (e.g. just created by the
    /// configuration dialogue, before any snapshot has arrived).
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    /// Build a mirror from a first snapshot, defaulting absent fields.
    pub fn from_snapshot(snapshot: JobSnapshot) -> Self {
        Self {
            id: snapshot.id,
            status: snapshot.status.unwrap_or(JobStatus::Pending),
            progress: snapshot.progress.unwrap_or(0),
            created_at: snapshot.created_at.unwrap_or_else(chrono::Utc::now),
            started_at: snapshot.started_at,
            completed_at: snapshot.completed_at,
            error_message: snapshot.error_message,
        }
    }
}

/// One observation of job state from either transport.
///
/// All fields except `id` are optional: the push stream sends partial
/// payloads, the poll transport sends full ones. Absent fields leave the
/// mirror untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// A snapshot carrying only an id (useful as a builder base).
    pub fn for_job(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            status: None,
            progress: None,
            created_at: None,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Result of applying a snapshot to a job mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The snapshot was applied (possibly a no-op replay).
    Applied,
    /// The snapshot ordered strictly below the applied state and was
    /// silently discarded. Not an error.
    StaleDiscarded,
}

/// Merge a snapshot into the mirror by shallow overwrite.
///
/// Present fields replace the mirror's, absent fields are preserved.
/// A snapshot whose `(status rank, progress)` orders strictly below the
/// mirror's is discarded: progress never decreases and a terminal status
/// never regresses to a non-terminal one. An accepted rank upgrade whose
/// progress figure trails the mirror's keeps the higher progress, so the
/// no-decrease rule holds for every accepted snapshot, not just the
/// rejected ones. Replaying an already-applied snapshot is a no-op.
pub fn merge_snapshot(job: &mut Job, snapshot: &JobSnapshot) -> MergeOutcome {
    let incoming_rank = snapshot.status.map_or(job.status.rank(), JobStatus::rank);
    let incoming_progress = snapshot.progress.unwrap_or(job.progress);

    if (incoming_rank, incoming_progress) < (job.status.rank(), job.progress) {
        tracing::debug!(
            job_id = %job.id,
            incoming_rank,
            incoming_progress,
            applied_rank = job.status.rank(),
            applied_progress = job.progress,
            "Discarding stale job snapshot",
        );
        return MergeOutcome::StaleDiscarded;
    }

    if let Some(status) = snapshot.status {
        job.status = status;
    }
    if let Some(progress) = snapshot.progress {
        // A rank upgrade may carry a lower progress figure; displayed
        // progress still never moves backwards.
        job.progress = job.progress.max(progress);
    }
    if let Some(created_at) = snapshot.created_at {
        job.created_at = created_at;
    }
    if let Some(started_at) = snapshot.started_at {
        job.started_at = Some(started_at);
    }
    if let Some(completed_at) = snapshot.completed_at {
        job.completed_at = Some(completed_at);
    }
    if let Some(ref message) = snapshot.error_message {
        job.error_message = Some(message.clone());
    }

    MergeOutcome::Applied
}
