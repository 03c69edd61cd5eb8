//! Queue progression: decides when the next waiting job starts and drives
//! each job through `waiting -> printing -> {complete | cancelled}`.
//!
//! The scheduler is synchronous and owned by the queue host task, which
//! serializes every call into it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::device::{DeviceEvent, PlotterDevice, ProgressSample, StartJob};
use crate::error::QueueResult;
use crate::queue::gate::ReadinessGate;
use crate::queue::job::{CancelSource, Job, JobStatus};
use crate::queue::progress::ProgressReporter;
use crate::queue::settings::{RenderSettings, SettingsOverrides};
use crate::queue::store::QueueStore;

/// Scheduler policy knobs.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub enabled: bool,
    /// Keep readiness armed after a completed job and start the next one.
    pub auto_advance: bool,
    pub progress_interval: Duration,
    pub baseline: RenderSettings,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_advance: false,
            progress_interval: Duration::from_millis(1500),
            baseline: RenderSettings::new(),
        }
    }
}

pub struct Scheduler {
    store: QueueStore,
    gate: ReadinessGate,
    device: Arc<dyn PlotterDevice>,
    reporter: ProgressReporter,
    baseline: RenderSettings,
    auto_advance: bool,
    active: Option<u64>,
}

impl Scheduler {
    pub fn new(
        device: Arc<dyn PlotterDevice>,
        events: mpsc::Sender<DeviceEvent>,
        options: SchedulerOptions,
    ) -> Self {
        let reporter = ProgressReporter::new(Arc::clone(&device), events, options.progress_interval);
        Self {
            store: QueueStore::new(),
            gate: ReadinessGate::new(options.enabled),
            device,
            reporter,
            baseline: options.baseline,
            auto_advance: options.auto_advance,
            active: None,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn active_job(&self) -> Option<u64> {
        self.active
    }

    pub fn set_auto_advance(&mut self, auto_advance: bool) {
        self.auto_advance = auto_advance;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.gate.set_enabled(enabled);
    }

    /// Replace the operator's baseline settings. Affects jobs started afterwards.
    pub fn set_baseline(&mut self, baseline: RenderSettings) {
        self.baseline = baseline;
    }

    /// Append a job and give the queue a chance to advance.
    pub fn enqueue(
        &mut self,
        name: &str,
        payload: &str,
        overrides: SettingsOverrides,
        no_resize: bool,
    ) -> QueueResult<u64> {
        let id = self.store.append(name, payload, overrides, no_resize)?.id;
        tracing::info!(job_id = id, name, "Queue item added");
        self.on_ready_or_item_added();
        Ok(id)
    }

    /// Set readiness and re-check the queue, even when the value is unchanged.
    pub fn set_ready(&mut self, ready: bool) {
        self.gate.set_ready(ready);
        self.on_ready_or_item_added();
    }

    /// Start the earliest waiting job if the gate is open and nothing prints.
    /// Returns the id of the job that was started.
    pub fn on_ready_or_item_added(&mut self) -> Option<u64> {
        if !self.gate.is_ready() || self.active.is_some() || self.store.is_busy() {
            return None;
        }
        let id = self.store.next_waiting()?;

        let job = match self.store.transition(id, JobStatus::Printing, Utc::now()) {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job_id = id, "Failed to start queue item: {}", e);
                return None;
            }
        };
        let command = StartJob {
            id,
            payload: job.payload.clone(),
            settings: job.settings_overrides.resolve(&self.baseline),
            no_resize: job.no_resize,
        };
        tracing::info!(job_id = id, name = %job.name, "Printing queue item");

        self.active = Some(id);
        self.device.start_job(command);
        self.reporter.start(id);
        Some(id)
    }

    /// The plotter began drawing `id`.
    pub fn on_job_started(&mut self, id: u64) {
        if self.active != Some(id) {
            tracing::warn!(job_id = id, "Start reported for a job that is not printing");
            return;
        }
        if let Ok(job) = self.store.get_mut(id) {
            if job.percent_complete == 0 {
                job.percent_complete = 1;
            }
        }
        if !self.reporter.is_running(id) {
            self.reporter.start(id);
        }
    }

    /// Apply a progress reading. Stale readings for jobs that already left
    /// `printing` are discarded.
    pub fn on_progress_sample(&mut self, id: u64, sample: ProgressSample) {
        if self.active != Some(id) {
            tracing::debug!(job_id = id, "Discarding progress for inactive job");
            return;
        }
        let Ok(job) = self.store.get_mut(id) else {
            return;
        };
        if let Some(pct) = sample.percent() {
            job.percent_complete = job.percent_complete.max(pct);
        }
        job.printing_status = sample.status;
    }

    /// The plotter finished `id`.
    pub fn on_job_finished(&mut self, id: u64) -> QueueResult<()> {
        let job = self.store.transition(id, JobStatus::Complete, Utc::now())?;
        tracing::info!(
            job_id = id,
            seconds_taken = job.seconds_taken.unwrap_or_default(),
            "Queue item complete"
        );
        self.reporter.stop(id);
        if self.active == Some(id) {
            self.active = None;
        }

        if self.auto_advance {
            self.on_ready_or_item_added();
        } else {
            // The operator has to re-arm readiness before the next job.
            self.gate.set_ready(false);
        }
        Ok(())
    }

    /// Cancel a waiting or printing job, then let the queue advance.
    pub fn on_job_cancelled(&mut self, id: u64, source: CancelSource) -> QueueResult<&Job> {
        let previous = self.store.get(id)?.status;
        self.store.transition(id, JobStatus::Cancelled, Utc::now())?;
        tracing::info!(job_id = id, ?source, "Queue item cancelled");

        if previous == JobStatus::Printing {
            self.reporter.stop(id);
            self.device.cancel_job(id);
        }
        if self.active == Some(id) {
            self.active = None;
        }

        self.on_ready_or_item_added();
        self.store.get(id)
    }

    pub fn on_device_unavailable(&mut self) {
        match self.active {
            Some(id) => tracing::warn!(job_id = id, "Plotter unavailable, progress frozen"),
            None => tracing::warn!("Plotter unavailable"),
        }
    }

    /// Dispatch an event reported by the plotter.
    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::JobStarted { id } => self.on_job_started(id),
            DeviceEvent::ProgressSample { id, sample } => self.on_progress_sample(id, sample),
            DeviceEvent::JobFinished { id } => {
                if let Err(e) = self.on_job_finished(id) {
                    tracing::warn!(job_id = id, "Ignoring finish event: {}", e);
                }
            }
            DeviceEvent::DeviceUnavailable => self.on_device_unavailable(),
        }
    }
}
