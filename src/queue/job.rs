// src/queue/job.rs - Queue item record and lifecycle states
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::queue::settings::SettingsOverrides;

/// Status shown while a job waits for the plotter.
pub const QUEUED_STATUS_TEXT: &str = "Queued";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Printing,
    Complete,
    Cancelled,
}

impl JobStatus {
    /// Legal forward transitions: waiting -> printing -> {complete, cancelled},
    /// plus waiting -> cancelled.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Waiting, JobStatus::Printing)
                | (JobStatus::Waiting, JobStatus::Cancelled)
                | (JobStatus::Printing, JobStatus::Complete)
                | (JobStatus::Printing, JobStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Waiting => write!(f, "waiting"),
            JobStatus::Printing => write!(f, "printing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Who asked for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelSource {
    Operator,
    Api,
}

/// One queued drawing with its own payload, overrides and lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u64,
    pub status: JobStatus,
    pub name: String,
    /// Opaque drawing content; never interpreted here.
    #[serde(rename = "svg")]
    pub payload: String,
    pub settings_overrides: SettingsOverrides,
    pub no_resize: bool,
    pub percent_complete: u8,
    pub printing_status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub seconds_taken: Option<f64>,
}

impl Job {
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            uri: job_uri(self.id),
            name: self.name.clone(),
            status: self.status,
            percent_complete: self.percent_complete,
        }
    }

    /// Stamp `end_time` and `seconds_taken`. Only the first call has any effect.
    ///
    /// Timestamps are kept at millisecond resolution, so `seconds_taken` is
    /// exactly `end_time - start_time`.
    pub(crate) fn finalize(&mut self, now: DateTime<Utc>) {
        if self.end_time.is_some() {
            return;
        }
        let end = now.trunc_subsecs(3);
        self.end_time = Some(end);
        self.seconds_taken = Some((end - self.start_time).num_milliseconds() as f64 / 1e3);
    }
}

/// Lightweight view used by list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: u64,
    pub uri: String,
    pub name: String,
    pub status: JobStatus,
    pub percent_complete: u8,
}

pub fn job_uri(id: u64) -> String {
    format!("/print/{}", id)
}
