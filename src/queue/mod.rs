//! Print queue engine: job records, readiness gate, scheduling, progress
//! sampling and the single-writer host task that ties them together.

pub mod gate;
pub mod host;
pub mod job;
pub mod progress;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use gate::ReadinessGate;
pub use host::{QueueHandle, QueueHost};
pub use job::{CancelSource, Job, JobStatus, JobSummary};
pub use progress::ProgressReporter;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use settings::{RenderSettings, SettingKey, SettingsOverrides};
pub use store::QueueStore;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::device::{DeviceEvent, PlotterDevice};

/// Capacity of the device event channel.
pub const DEVICE_EVENT_BUFFER: usize = 64;

impl SchedulerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.queue.enabled,
            auto_advance: config.queue.auto_advance,
            progress_interval: Duration::from_millis(config.queue.progress_interval_ms),
            baseline: config.settings.clone(),
        }
    }
}

/// Build the scheduler for `device` and spawn its host task.
///
/// `events` must be the receiving half of the channel the device reports on.
pub fn start_queue(
    device: Arc<dyn PlotterDevice>,
    events_tx: mpsc::Sender<DeviceEvent>,
    events: mpsc::Receiver<DeviceEvent>,
    options: SchedulerOptions,
    request_buffer: usize,
) -> (QueueHandle, JoinHandle<()>) {
    let scheduler = Scheduler::new(device, events_tx.clone(), options);
    QueueHost::new(scheduler).spawn(events_tx, events, request_buffer)
}
