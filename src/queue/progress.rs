// src/queue/progress.rs - Periodic progress sampling for the printing job
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::device::{DeviceEvent, PlotterDevice};

struct Sampler {
    job_id: u64,
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Polls the plotter on a fixed interval and forwards each reading to the
/// queue host as a [`DeviceEvent::ProgressSample`] tagged with the job id.
/// The host drops samples whose id is no longer the printing job.
pub struct ProgressReporter {
    device: Arc<dyn PlotterDevice>,
    events: mpsc::Sender<DeviceEvent>,
    interval: Duration,
    active: Option<Sampler>,
}

impl ProgressReporter {
    pub fn new(
        device: Arc<dyn PlotterDevice>,
        events: mpsc::Sender<DeviceEvent>,
        interval: Duration,
    ) -> Self {
        Self { device, events, interval, active: None }
    }

    /// Start sampling for `job_id`, replacing any loop already running.
    pub fn start(&mut self, job_id: u64) {
        self.halt();

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let device = Arc::clone(&self.device);
        let events = self.events.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await; // skip immediate first tick
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let Some(sample) = device.sample_progress() else {
                            tracing::debug!(job_id, "Plotter unavailable, skipping progress sample");
                            continue;
                        };
                        if events.send(DeviceEvent::ProgressSample { id: job_id, sample }).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(job_id, "Progress sampling stopped");
        });

        tracing::debug!(job_id, interval_ms = period.as_millis() as u64, "Progress sampling started");
        self.active = Some(Sampler { job_id, stop_tx, handle });
    }

    /// Stop sampling for `job_id`. No-op if that job is not being sampled.
    pub fn stop(&mut self, job_id: u64) {
        if self.active_job() == Some(job_id) {
            self.halt();
        }
    }

    pub fn active_job(&self) -> Option<u64> {
        self.active
            .as_ref()
            .filter(|sampler| !sampler.handle.is_finished())
            .map(|sampler| sampler.job_id)
    }

    pub fn is_running(&self, job_id: u64) -> bool {
        self.active_job() == Some(job_id)
    }

    fn halt(&mut self) {
        if let Some(sampler) = self.active.take() {
            let _ = sampler.stop_tx.send(());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(sampler) = self.active.take() {
            sampler.handle.abort();
        }
    }
}
