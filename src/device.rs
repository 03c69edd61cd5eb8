//! Interface to the render/plot collaborator.
//!
//! The queue core never waits on the plotter. It emits fire-and-forget
//! commands through [`PlotterDevice`], polls progress, and consumes
//! [`DeviceEvent`]s the plotter pushes back through the host's event channel.

use std::sync::Mutex;

use crate::queue::settings::RenderSettings;

/// Everything the plotter needs to start drawing a job.
#[derive(Debug, Clone, PartialEq)]
pub struct StartJob {
    pub id: u64,
    pub payload: String,
    pub settings: RenderSettings,
    pub no_resize: bool,
}

/// One progress reading: `numerator` of `denominator` units done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSample {
    pub numerator: u64,
    pub denominator: u64,
    pub status: String,
}

impl ProgressSample {
    pub fn new(numerator: u64, denominator: u64, status: impl Into<String>) -> Self {
        Self { numerator, denominator, status: status.into() }
    }

    /// Floor of `numerator / denominator * 100`, capped at 100. `None` when the
    /// denominator is zero.
    pub fn percent(&self) -> Option<u8> {
        if self.denominator == 0 {
            return None;
        }
        let pct = u128::from(self.numerator) * 100 / u128::from(self.denominator);
        Some(pct.min(100) as u8)
    }
}

/// Events the plotter reports back to the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    JobStarted { id: u64 },
    ProgressSample { id: u64, sample: ProgressSample },
    JobFinished { id: u64 },
    DeviceUnavailable,
}

/// Commands the queue sends to the plotter, plus the progress poll.
pub trait PlotterDevice: Send + Sync {
    /// Begin drawing. Must return without waiting for the drawing to finish.
    fn start_job(&self, job: StartJob);
    /// Abort a job the plotter may be drawing.
    fn cancel_job(&self, id: u64);
    /// Current progress, or `None` while the device cannot be reached.
    fn sample_progress(&self) -> Option<ProgressSample>;
}

/// A command observed by [`RecordingPlotter`], in the order it was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotterCommand {
    Start(StartJob),
    Cancel(u64),
}

/// In-memory plotter that records commands and replays a scripted progress
/// value. Part of the public API so embedders can drive a queue without
/// hardware, the way the integration tests do.
#[derive(Debug, Default)]
pub struct RecordingPlotter {
    commands: Mutex<Vec<PlotterCommand>>,
    progress: Mutex<Option<ProgressSample>>,
}

impl RecordingPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress returned by the next polls; `None` simulates an offline device.
    pub fn set_progress(&self, sample: Option<ProgressSample>) {
        if let Ok(mut guard) = self.progress.lock() {
            *guard = sample;
        }
    }

    pub fn commands(&self) -> Vec<PlotterCommand> {
        self.commands
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn started(&self) -> Vec<StartJob> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                PlotterCommand::Start(job) => Some(job),
                PlotterCommand::Cancel(_) => None,
            })
            .collect()
    }

    fn record(&self, cmd: PlotterCommand) {
        if let Ok(mut guard) = self.commands.lock() {
            guard.push(cmd);
        }
    }
}

impl PlotterDevice for RecordingPlotter {
    fn start_job(&self, job: StartJob) {
        self.record(PlotterCommand::Start(job));
    }

    fn cancel_job(&self, id: u64) {
        self.record(PlotterCommand::Cancel(id));
    }

    fn sample_progress(&self) -> Option<ProgressSample> {
        self.progress.lock().ok().and_then(|guard| guard.clone())
    }
}
