//! Bookkeeping for in-flight and already-done warm-up work.

use std::collections::HashSet;

use sitepulse_core::{JobId, TabKind};

/// Tracks which warm-up work is in flight or already done.
///
/// Scoped to one page session and owned by the `WarmupCache` behind a
/// mutex; there is no module-global registry, so tests construct a fresh
/// one per case. All state belongs to [`active_job`](Self::activate):
/// when the active job id changes, every flag is cleared — warm-up state
/// must never leak from job A's view into job B's.
#[derive(Debug, Default)]
pub struct WarmupRegistry {
    active_job: Option<JobId>,
    in_flight: HashSet<JobId>,
    warmed_tabs: HashSet<TabKind>,
}

impl WarmupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the registry to `job_id`, resetting all state when it differs
    /// from the current active job.
    pub fn activate(&mut self, job_id: &str) {
        if self.active_job.as_deref() == Some(job_id) {
            return;
        }
        if self.active_job.is_some() {
            tracing::debug!(job_id, "Active job changed, resetting warm-up registry");
        }
        self.in_flight.clear();
        self.warmed_tabs.clear();
        self.active_job = Some(job_id.to_string());
    }

    /// Claim the in-flight slot for `job_id`. Returns `false` when a
    /// warm-up call for this job is already running.
    pub fn try_begin(&mut self, job_id: &str) -> bool {
        self.in_flight.insert(job_id.to_string())
    }

    /// Release the in-flight slot so a later trigger can retry.
    pub fn finish(&mut self, job_id: &str) {
        self.in_flight.remove(job_id);
    }

    /// Claim the warmed flag for a tab. Returns `false` when the tab's
    /// module was already requested this page lifetime.
    pub fn try_mark_tab(&mut self, kind: TabKind) -> bool {
        self.warmed_tabs.insert(kind)
    }

    /// Drop the warmed flag after a failed module load.
    pub fn unmark_tab(&mut self, kind: TabKind) {
        self.warmed_tabs.remove(&kind);
    }

    pub fn is_in_flight(&self, job_id: &str) -> bool {
        self.in_flight.contains(job_id)
    }

    pub fn is_tab_warmed(&self, kind: TabKind) -> bool {
        self.warmed_tabs.contains(&kind)
    }
}
