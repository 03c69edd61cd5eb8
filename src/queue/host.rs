// src/queue/host.rs - Single-writer task owning the queue, and its client handle
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::device::DeviceEvent;
use crate::error::{QueueError, QueueResult};
use crate::queue::job::{CancelSource, Job};
use crate::queue::scheduler::Scheduler;
use crate::queue::settings::{RenderSettings, SettingsOverrides};
use crate::web::queue_channel::{NewJob, QueueRequest, QueueSnapshot};

/// Owns the scheduler and serializes every request and device event into it.
pub struct QueueHost {
    scheduler: Scheduler,
    surface_attached: bool,
}

impl QueueHost {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler, surface_attached: false }
    }

    /// Spawn the host task. Device events must be sent on the sender that was
    /// paired with `events` (the same one handed to the scheduler).
    pub fn spawn(
        self,
        events_tx: mpsc::Sender<DeviceEvent>,
        events: mpsc::Receiver<DeviceEvent>,
        buffer: usize,
    ) -> (QueueHandle, JoinHandle<()>) {
        let (request_tx, request_rx) = mpsc::channel::<QueueRequest>(buffer);
        let task = tokio::spawn(self.run(request_rx, events));
        (QueueHandle { requests: request_tx, events: events_tx }, task)
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<QueueRequest>,
        mut events: mpsc::Receiver<DeviceEvent>,
    ) {
        tracing::info!("Queue host started");
        loop {
            tokio::select! {
                // Events queued before a request are applied first.
                biased;
                Some(event) = events.recv() => self.scheduler.handle_event(event),
                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
            }
        }
        tracing::info!("Queue host shutting down");
    }

    fn snapshot(&self) -> QueueSnapshot {
        let store = self.scheduler.store();
        let gate = self.scheduler.gate();
        QueueSnapshot {
            enabled: gate.is_enabled(),
            ready: gate.is_ready(),
            items: store.len(),
            queue: store.list(),
        }
    }

    fn create(&mut self, job: NewJob) -> QueueResult<Job> {
        if !self.scheduler.gate().is_enabled() {
            return Err(QueueError::Forbidden);
        }
        if job.options_missing {
            return Err(QueueError::Validation("body content node required: options".to_string()));
        }
        let overrides = SettingsOverrides::filter(job.settings_overrides);
        let id = self
            .scheduler
            .enqueue(&job.name, &job.payload, overrides, job.no_resize)?;
        self.scheduler.store().get(id).cloned()
    }

    fn cancel(&mut self, id: u64, source: CancelSource) -> QueueResult<Job> {
        if source == CancelSource::Api && !self.scheduler.gate().is_enabled() {
            return Err(QueueError::Forbidden);
        }
        self.scheduler.on_job_cancelled(id, source).cloned()
    }

    fn set_ready(&mut self, ready: bool) -> QueueResult<bool> {
        if !self.surface_attached {
            return Err(QueueError::Unavailable);
        }
        self.scheduler.set_ready(ready);
        Ok(self.scheduler.gate().is_ready())
    }

    fn attach_surface(&mut self, attached: bool) {
        tracing::info!(attached, "Remote print surface changed");
        self.surface_attached = attached;
        if !attached {
            // Readiness is granted by an operator looking at the open surface.
            self.scheduler.set_ready(false);
        }
    }

    fn handle_request(&mut self, request: QueueRequest) {
        match request {
            QueueRequest::List { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            QueueRequest::Create { job, respond_to } => {
                let _ = respond_to.send(self.create(job));
            }
            QueueRequest::Get { id, respond_to } => {
                let _ = respond_to.send(self.scheduler.store().get(id).cloned());
            }
            QueueRequest::Cancel { id, source, respond_to } => {
                let _ = respond_to.send(self.cancel(id, source));
            }
            QueueRequest::SetReady { ready, respond_to } => {
                let _ = respond_to.send(self.set_ready(ready));
            }
            QueueRequest::SetEnabled { enabled, respond_to } => {
                self.scheduler.set_enabled(enabled);
                let _ = respond_to.send(());
            }
            QueueRequest::SetAutoAdvance { auto_advance, respond_to } => {
                self.scheduler.set_auto_advance(auto_advance);
                let _ = respond_to.send(());
            }
            QueueRequest::UpdateBaseline { settings, respond_to } => {
                self.scheduler.set_baseline(settings);
                let _ = respond_to.send(());
            }
            QueueRequest::AttachSurface { attached, respond_to } => {
                self.attach_surface(attached);
                let _ = respond_to.send(());
            }
        }
    }
}

/// Clonable client of the queue host: the control surface used by the HTTP
/// layer, the operator UI and the plotter.
#[derive(Clone)]
pub struct QueueHandle {
    requests: mpsc::Sender<QueueRequest>,
    events: mpsc::Sender<DeviceEvent>,
}

impl QueueHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> QueueRequest,
    ) -> QueueResult<T> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.requests
            .send(build(resp_tx))
            .await
            .map_err(|_| QueueError::HostStopped)?;
        resp_rx.await.map_err(|_| QueueError::HostStopped)
    }

    pub async fn list(&self) -> QueueResult<QueueSnapshot> {
        self.call(|respond_to| QueueRequest::List { respond_to }).await
    }

    pub async fn create(&self, job: NewJob) -> QueueResult<Job> {
        self.call(|respond_to| QueueRequest::Create { job, respond_to }).await?
    }

    pub async fn get(&self, id: u64) -> QueueResult<Job> {
        self.call(|respond_to| QueueRequest::Get { id, respond_to }).await?
    }

    /// Cancel on behalf of an API client; refused while the queue is disabled.
    pub async fn cancel(&self, id: u64) -> QueueResult<Job> {
        self.call(|respond_to| QueueRequest::Cancel { id, source: CancelSource::Api, respond_to })
            .await?
    }

    /// Cancel from the operator's side; allowed even while disabled.
    pub async fn cancel_by_operator(&self, id: u64) -> QueueResult<Job> {
        self.call(|respond_to| QueueRequest::Cancel {
            id,
            source: CancelSource::Operator,
            respond_to,
        })
        .await?
    }

    pub async fn set_ready(&self, ready: bool) -> QueueResult<bool> {
        self.call(|respond_to| QueueRequest::SetReady { ready, respond_to }).await?
    }

    pub async fn set_enabled(&self, enabled: bool) -> QueueResult<()> {
        self.call(|respond_to| QueueRequest::SetEnabled { enabled, respond_to }).await
    }

    pub async fn set_auto_advance(&self, auto_advance: bool) -> QueueResult<()> {
        self.call(|respond_to| QueueRequest::SetAutoAdvance { auto_advance, respond_to })
            .await
    }

    pub async fn update_baseline_settings(&self, settings: RenderSettings) -> QueueResult<()> {
        self.call(|respond_to| QueueRequest::UpdateBaseline { settings, respond_to }).await
    }

    pub async fn attach_surface(&self, attached: bool) -> QueueResult<()> {
        self.call(|respond_to| QueueRequest::AttachSurface { attached, respond_to }).await
    }

    /// Deliver an event from the plotter.
    pub async fn notify(&self, event: DeviceEvent) -> QueueResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| QueueError::HostStopped)
    }
}
