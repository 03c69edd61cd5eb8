//! Integration tests for the queue host driven through its handle

use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;

use remote_print::config::SimulatorConfig;
use remote_print::device::{DeviceEvent, PlotterCommand, ProgressSample, RecordingPlotter};
use remote_print::queue::{start_queue, JobStatus, QueueHandle, SchedulerOptions};
use remote_print::simulator::SimulatedPlotter;
use remote_print::web::queue_channel::NewJob;
use remote_print::QueueError;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

fn spawn_queue(options: SchedulerOptions) -> (QueueHandle, Arc<RecordingPlotter>) {
    let device = Arc::new(RecordingPlotter::new());
    let (events_tx, events_rx) = mpsc::channel(16);
    let (handle, _task) = start_queue(device.clone(), events_tx, events_rx, options, 8);
    (handle, device)
}

fn drawing(name: &str) -> NewJob {
    NewJob {
        name: name.to_string(),
        payload: format!("<svg><title>{}</title></svg>", name),
        ..NewJob::default()
    }
}

async fn printing_count(handle: &QueueHandle) -> usize {
    let snapshot = handle.list().await.unwrap();
    snapshot
        .queue
        .iter()
        .filter(|item| item.status == JobStatus::Printing)
        .count()
}

#[tokio::test]
async fn test_ids_are_dense_and_increasing() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    for expected in 0..6u64 {
        let job = handle.create(drawing("Dense")).await.unwrap();
        assert_eq!(job.id, expected);
        if expected % 2 == 1 {
            assert_ok!(handle.cancel(expected).await);
        }
    }
    // Rejected creations do not consume an id.
    assert_err!(handle.create(NewJob::default()).await);
    assert_eq!(handle.create(drawing("Next")).await.unwrap().id, 6);

    let ids: Vec<u64> = handle.list().await.unwrap().queue.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_single_print_then_finish() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();

    let job = handle.create(drawing("A")).await.unwrap();
    assert_eq!(job.id, 0);
    assert_eq!(job.status, JobStatus::Waiting);
    assert!(device.commands().is_empty());

    assert_eq!(handle.set_ready(true).await, Ok(true));
    assert_eq!(device.started().len(), 1);
    assert_eq!(device.started()[0].id, 0);
    assert_eq!(handle.get(0).await.unwrap().status, JobStatus::Printing);

    handle
        .notify(DeviceEvent::ProgressSample { id: 0, sample: ProgressSample::new(50, 100, "halfway") })
        .await
        .unwrap();
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.percent_complete, 50);
    assert_eq!(job.printing_status, "halfway");

    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.percent_complete, 100);
}

#[tokio::test]
async fn test_second_job_waits_for_rearm() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.create(drawing("B")).await.unwrap();

    handle.set_ready(true).await.unwrap();
    assert_eq!(device.started().len(), 1);
    assert_eq!(handle.get(1).await.unwrap().status, JobStatus::Waiting);

    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    let snapshot = handle.list().await.unwrap();
    assert!(!snapshot.ready);
    assert_eq!(snapshot.queue[1].status, JobStatus::Waiting);
    assert_eq!(device.started().len(), 1);

    handle.set_ready(true).await.unwrap();
    assert_eq!(handle.get(1).await.unwrap().status, JobStatus::Printing);
    assert_eq!(device.started()[1].id, 1);
}

#[tokio::test]
async fn test_auto_advance_moves_on_after_completion() {
    let options = SchedulerOptions { auto_advance: true, ..SchedulerOptions::default() };
    let (handle, device) = spawn_queue(options);
    handle.attach_surface(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.create(drawing("B")).await.unwrap();
    handle.set_ready(true).await.unwrap();

    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    let snapshot = handle.list().await.unwrap();
    assert!(snapshot.ready);
    assert_eq!(snapshot.queue[1].status, JobStatus::Printing);
    assert_eq!(device.started().len(), 2);
}

#[tokio::test]
async fn test_cancel_waiting_job_leaves_printing_job_alone() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.create(drawing("B")).await.unwrap();

    let cancelled = handle.cancel(1).await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert!(cancelled.end_time.is_some());

    let printing = handle.get(0).await.unwrap();
    assert_eq!(printing.status, JobStatus::Printing);
    assert!(printing.end_time.is_none());
    assert!(!device.commands().contains(&PlotterCommand::Cancel(0)));
    assert!(!device.commands().contains(&PlotterCommand::Cancel(1)));
}

#[tokio::test]
async fn test_cancel_printing_job_starts_next() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.create(drawing("B")).await.unwrap();

    handle.cancel(0).await.unwrap();
    assert!(device.commands().contains(&PlotterCommand::Cancel(0)));
    assert_eq!(handle.get(1).await.unwrap().status, JobStatus::Printing);
    assert_eq!(printing_count(&handle).await, 1);
}

#[tokio::test]
async fn test_cancel_complete_job_is_rejected_unchanged() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();

    let before = handle.get(0).await.unwrap();
    let result = handle.cancel(0).await;
    assert_eq!(
        result,
        Err(QueueError::InvalidStateTransition { id: 0, status: JobStatus::Complete })
    );
    let after = handle.get(0).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(serde_json::to_string(&before).unwrap(), serde_json::to_string(&after).unwrap());
}

#[tokio::test]
async fn test_create_while_disabled_is_forbidden() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    handle.create(drawing("A")).await.unwrap();
    handle.set_enabled(false).await.unwrap();

    assert_eq!(handle.create(drawing("B")).await, Err(QueueError::Forbidden));
    let snapshot = handle.list().await.unwrap();
    assert!(!snapshot.enabled);
    assert_eq!(snapshot.items, 1);
}

#[tokio::test]
async fn test_disabling_does_not_stop_printing_job() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.set_enabled(false).await.unwrap();

    assert_eq!(handle.get(0).await.unwrap().status, JobStatus::Printing);
    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    assert_eq!(handle.get(0).await.unwrap().status, JobStatus::Complete);
}

#[tokio::test]
async fn test_completion_overrides_sampled_progress() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle
        .notify(DeviceEvent::ProgressSample { id: 0, sample: ProgressSample::new(3, 10, "path 3") })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_micros(1700)).await;
    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();

    let job = handle.get(0).await.unwrap();
    assert_eq!(job.percent_complete, 100);
    let end = job.end_time.unwrap();
    assert_eq!(job.start_time.nanosecond() % 1_000_000, 0);
    assert_eq!(end.nanosecond() % 1_000_000, 0);
    let exact = (end - job.start_time).num_nanoseconds().unwrap() as f64 / 1e9;
    assert_eq!(job.seconds_taken, Some(exact));
    assert!(exact >= 0.001);

    let json = serde_json::to_value(&job).unwrap();
    assert_eq!(json["secondsTaken"], json!(exact));
}

#[tokio::test]
async fn test_stale_progress_after_completion_is_ignored() {
    let (handle, _device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("A")).await.unwrap();
    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    handle
        .notify(DeviceEvent::ProgressSample { id: 0, sample: ProgressSample::new(1, 10, "late") })
        .await
        .unwrap();

    let job = handle.get(0).await.unwrap();
    assert_eq!(job.percent_complete, 100);
    assert_ne!(job.printing_status, "late");
}

#[tokio::test]
async fn test_unknown_override_keys_never_reach_plotter() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();

    let mut job = drawing("Overrides");
    job.settings_overrides.insert("fillangle".to_string(), json!(45));
    job.settings_overrides.insert("strokeprecision".to_string(), json!(3));
    job.settings_overrides.insert("speed".to_string(), json!(9000));
    job.settings_overrides.insert("fillAngle".to_string(), json!(1));
    let created = handle.create(job).await.unwrap();
    assert_eq!(created.settings_overrides.len(), 2);

    handle.set_ready(true).await.unwrap();
    let started = &device.started()[0];
    assert_eq!(started.settings["fillangle"], json!(45));
    assert_eq!(started.settings["strokeprecision"], json!(3));
    assert!(!started.settings.contains_key("speed"));
    assert!(!started.settings.contains_key("fillAngle"));
}

#[tokio::test]
async fn test_at_most_one_printing_through_mixed_operations() {
    let options = SchedulerOptions { auto_advance: true, ..SchedulerOptions::default() };
    let (handle, _device) = spawn_queue(options);
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();

    for round in 0..4u64 {
        handle.create(drawing("Batch")).await.unwrap();
        assert!(printing_count(&handle).await <= 1);
        handle.set_ready(true).await.unwrap();
        assert!(printing_count(&handle).await <= 1);
        if round % 2 == 0 {
            handle.notify(DeviceEvent::JobFinished { id: round / 2 }).await.unwrap();
        }
        assert!(printing_count(&handle).await <= 1);
    }
    handle.notify(DeviceEvent::JobStarted { id: 3 }).await.unwrap();
    handle.notify(DeviceEvent::DeviceUnavailable).await.unwrap();
    assert_eq!(printing_count(&handle).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_sampled_progress_reaches_job_record() {
    let (handle, device) = spawn_queue(SchedulerOptions::default());
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    device.set_progress(Some(ProgressSample::new(1, 3, "x")));
    handle.create(drawing("Sampled")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.percent_complete, 33);
    assert_eq!(job.printing_status, "x");

    // An offline plotter freezes progress at the last reading.
    device.set_progress(None);
    tokio::time::sleep(Duration::from_millis(1600)).await;
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.percent_complete, 33);
    assert_eq!(job.printing_status, "x");

    device.set_progress(Some(ProgressSample::new(2, 3, "y")));
    handle.notify(DeviceEvent::JobFinished { id: 0 }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3200)).await;
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.status, JobStatus::Complete);
    assert_eq!(job.percent_complete, 100);
    assert_eq!(job.printing_status, "x");
}

#[tokio::test(start_paused = true)]
async fn test_simulated_plotter_runs_job_to_completion() {
    let (events_tx, events_rx) = mpsc::channel(16);
    let config = SimulatorConfig { steps: 5, step_ms: 200 };
    let device = Arc::new(SimulatedPlotter::new(&config, events_tx.clone()));
    let options = SchedulerOptions {
        progress_interval: Duration::from_millis(300),
        ..SchedulerOptions::default()
    };
    let (handle, _task) = start_queue(device, events_tx, events_rx, options, 8);
    handle.attach_surface(true).await.unwrap();
    handle.set_ready(true).await.unwrap();
    handle.create(drawing("Simulated")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(650)).await;
    let job = handle.get(0).await.unwrap();
    assert_eq!(job.status, JobStatus::Printing);
    assert!(job.percent_complete >= 20 && job.percent_complete <= 60);
    assert!(job.printing_status.starts_with("Drawing path"));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    let snapshot = handle.list().await.unwrap();
    assert_eq!(snapshot.queue[0].status, JobStatus::Complete);
    assert_eq!(snapshot.queue[0].percent_complete, 100);
    assert!(!snapshot.ready);
}
