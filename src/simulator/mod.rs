//! Simulated plotter.
//!
//! Stands in for the render/motion collaborator: each job is drawn as a fixed
//! number of path steps with a jittered step interval. It answers progress
//! polls and reports start and finish through the device event channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;

use crate::config::SimulatorConfig;
use crate::device::{DeviceEvent, PlotterDevice, ProgressSample, StartJob};

#[derive(Debug, Clone, Copy)]
struct Run {
    id: u64,
    done: u64,
}

pub struct SimulatedPlotter {
    current: Arc<Mutex<Option<Run>>>,
    events: mpsc::Sender<DeviceEvent>,
    steps: u64,
    step: Duration,
}

impl SimulatedPlotter {
    pub fn new(config: &SimulatorConfig, events: mpsc::Sender<DeviceEvent>) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            events,
            steps: config.steps.max(1),
            step: Duration::from_millis(config.step_ms),
        }
    }

    /// Record progress for `id`; false once the run was cancelled or replaced.
    fn advance(current: &Mutex<Option<Run>>, id: u64, done: u64) -> bool {
        let Ok(mut guard) = current.lock() else {
            return false;
        };
        match guard.as_mut() {
            Some(run) if run.id == id => {
                run.done = done;
                true
            }
            _ => false,
        }
    }
}

impl PlotterDevice for SimulatedPlotter {
    fn start_job(&self, job: StartJob) {
        let id = job.id;
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(Run { id, done: 0 });
        }
        tracing::info!(
            job_id = id,
            bytes = job.payload.len(),
            settings = job.settings.len(),
            no_resize = job.no_resize,
            "Simulator accepted drawing"
        );

        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        let steps = self.steps;
        let step = self.step;

        tokio::spawn(async move {
            if events.send(DeviceEvent::JobStarted { id }).await.is_err() {
                return;
            }
            for done in 1..=steps {
                let jitter: f64 = rand::rng().random_range(0.8..1.2);
                tokio::time::sleep(step.mul_f64(jitter)).await;
                if !Self::advance(&current, id, done) {
                    tracing::debug!(job_id = id, "Simulated drawing aborted");
                    return;
                }
            }
            if let Ok(mut guard) = current.lock() {
                if guard.is_some_and(|run| run.id == id) {
                    *guard = None;
                }
            }
            let _ = events.send(DeviceEvent::JobFinished { id }).await;
        });
    }

    fn cancel_job(&self, id: u64) {
        if let Ok(mut guard) = self.current.lock() {
            if guard.is_some_and(|run| run.id == id) {
                *guard = None;
                tracing::info!(job_id = id, "Simulator cleared drawing");
            }
        }
    }

    fn sample_progress(&self) -> Option<ProgressSample> {
        let run = (*self.current.lock().ok()?)?;
        Some(ProgressSample::new(
            run.done,
            self.steps,
            format!("Drawing path {} of {}", run.done, self.steps),
        ))
    }
}
