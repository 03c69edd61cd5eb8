//! Defines the communication channel messages between the web server and the queue host task.

use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::QueueResult;
use crate::queue::job::{CancelSource, Job, JobSummary};
use crate::queue::settings::RenderSettings;

/// A creation request as it arrives from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub name: String,
    pub payload: String,
    /// Raw override object; unknown keys are dropped on the way in.
    pub settings_overrides: serde_json::Map<String, serde_json::Value>,
    pub no_resize: bool,
    /// The request carried no options block at all.
    pub options_missing: bool,
}

/// Gate state plus the queue summaries, as returned by the list operation.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub enabled: bool,
    pub ready: bool,
    pub items: usize,
    pub queue: Vec<JobSummary>,
}

/// Represents a request sent to the queue host task.
#[derive(Debug)]
pub enum QueueRequest {
    /// List the queue and the gate state.
    List {
        respond_to: oneshot::Sender<QueueSnapshot>,
    },
    /// Append a new job.
    Create {
        job: NewJob,
        respond_to: oneshot::Sender<QueueResult<Job>>,
    },
    /// Fetch a single job record.
    Get {
        id: u64,
        respond_to: oneshot::Sender<QueueResult<Job>>,
    },
    /// Cancel a waiting or printing job.
    Cancel {
        id: u64,
        source: CancelSource,
        respond_to: oneshot::Sender<QueueResult<Job>>,
    },
    /// Arm or disarm readiness.
    SetReady {
        ready: bool,
        respond_to: oneshot::Sender<QueueResult<bool>>,
    },
    /// Operator: allow or forbid mutating requests.
    SetEnabled {
        enabled: bool,
        respond_to: oneshot::Sender<()>,
    },
    /// Operator: keep readiness armed between jobs.
    SetAutoAdvance {
        auto_advance: bool,
        respond_to: oneshot::Sender<()>,
    },
    /// Operator: replace the baseline render settings.
    UpdateBaseline {
        settings: RenderSettings,
        respond_to: oneshot::Sender<()>,
    },
    /// Operator: the remote print surface was opened or closed.
    AttachSurface {
        attached: bool,
        respond_to: oneshot::Sender<()>,
    },
}
