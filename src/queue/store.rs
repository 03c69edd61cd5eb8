// src/queue/store.rs - Ordered, append-only collection of queue items
use chrono::{DateTime, SubsecRound, Utc};

use crate::error::{QueueError, QueueResult};
use crate::queue::job::{Job, JobStatus, JobSummary, QUEUED_STATUS_TEXT};
use crate::queue::settings::SettingsOverrides;

/// Owns every job ever created. Jobs are never removed, so a job's id is also
/// its index for the lifetime of the store.
#[derive(Debug, Default)]
pub struct QueueStore {
    jobs: Vec<Job>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Append a new waiting job and return it.
    pub fn append(
        &mut self,
        name: &str,
        payload: &str,
        overrides: SettingsOverrides,
        no_resize: bool,
    ) -> QueueResult<&Job> {
        if name.is_empty() {
            return Err(QueueError::Validation("name option required: options.name".to_string()));
        }
        if payload.is_empty() {
            return Err(QueueError::Validation("body content node required: svg".to_string()));
        }

        let id = self.jobs.len() as u64;
        self.jobs.push(Job {
            id,
            status: JobStatus::Waiting,
            name: name.to_string(),
            payload: payload.to_string(),
            settings_overrides: overrides,
            no_resize,
            percent_complete: 0,
            printing_status: QUEUED_STATUS_TEXT.to_string(),
            start_time: Utc::now().trunc_subsecs(3),
            end_time: None,
            seconds_taken: None,
        });
        tracing::debug!(job_id = id, name, "Queue item appended");
        Ok(&self.jobs[id as usize])
    }

    pub fn get(&self, id: u64) -> QueueResult<&Job> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.jobs.get(idx))
            .ok_or(QueueError::NotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> QueueResult<&mut Job> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.jobs.get_mut(idx))
            .ok_or(QueueError::NotFound(id))
    }

    /// Summaries in creation order.
    pub fn list(&self) -> Vec<JobSummary> {
        self.jobs.iter().map(Job::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// True iff the most recently created job is printing. Only the tail is
    /// inspected; with a single printing job at most this is sufficient as
    /// long as the scheduler never starts a job while the tail prints.
    pub fn is_busy(&self) -> bool {
        self.jobs
            .last()
            .is_some_and(|job| job.status == JobStatus::Printing)
    }

    /// Earliest waiting job, skipping completed and cancelled ones.
    pub fn next_waiting(&self) -> Option<u64> {
        self.jobs
            .iter()
            .find(|job| job.status == JobStatus::Waiting)
            .map(|job| job.id)
    }

    /// Move a job to `next`, rejecting anything the lifecycle forbids.
    pub(crate) fn transition(
        &mut self,
        id: u64,
        next: JobStatus,
        now: DateTime<Utc>,
    ) -> QueueResult<&Job> {
        let job = self.get_mut(id)?;
        if !job.status.can_transition_to(next) {
            return Err(QueueError::InvalidStateTransition { id, status: job.status });
        }
        job.status = next;
        match next {
            JobStatus::Complete => {
                job.percent_complete = 100;
                job.finalize(now);
            }
            JobStatus::Cancelled => job.finalize(now),
            JobStatus::Printing | JobStatus::Waiting => {}
        }
        Ok(job)
    }
}
