//! Transport selection policy.

use sitepulse_client::Transport;
use sitepulse_core::{Job, JobStatus};

/// Choose the status transport for a job's current state.
///
/// Push exists to cut down polling while the pipeline is actively
/// working, so it is preferred for any active non-terminal job. Idle
/// pending jobs and terminal jobs poll: the former has no event flow
/// worth a stream, the latter needs at most one confirming fetch. When a
/// push stream later breaks, the controller restarts the source as pull —
/// that fallback lives in the controller, not here.
pub fn select_transport(job: &Job) -> Transport {
    if job.status.is_terminal() || (job.status == JobStatus::Pending && job.progress == 0) {
        Transport::Pull
    } else {
        Transport::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepulse_core::{merge_snapshot, JobSnapshot};

    fn job_with(status: JobStatus, progress: u8) -> Job {
        let mut job = Job::new("job-1".into());
        merge_snapshot(
            &mut job,
            &JobSnapshot::for_job("job-1")
                .with_status(status)
                .with_progress(progress),
        );
        job
    }

    #[test]
    fn running_prefers_push() {
        assert_eq!(
            select_transport(&job_with(JobStatus::Running, 10)),
            Transport::Push
        );
    }

    #[test]
    fn pending_with_progress_prefers_push() {
        assert_eq!(
            select_transport(&job_with(JobStatus::Pending, 5)),
            Transport::Push
        );
    }

    #[test]
    fn idle_pending_polls() {
        assert_eq!(
            select_transport(&job_with(JobStatus::Pending, 0)),
            Transport::Pull
        );
    }

    #[test]
    fn terminal_jobs_poll() {
        assert_eq!(
            select_transport(&job_with(JobStatus::Completed, 100)),
            Transport::Pull
        );
        assert_eq!(
            select_transport(&job_with(JobStatus::Failed, 40)),
            Transport::Pull
        );
    }
}
