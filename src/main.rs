// src/main.rs - Plot host entry point
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use remote_print::config::{self, Config, ConfigError};
use remote_print::device::PlotterDevice;
use remote_print::queue::{start_queue, SchedulerOptions, DEVICE_EVENT_BUFFER};
use remote_print::simulator::SimulatedPlotter;
use remote_print::web;

#[derive(Parser, Debug)]
#[command(name = "plot-host", version, about = "Remote print queue for a pen plotter")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "plotter.toml")]
    config: PathBuf,
    /// Override the HTTP listen address
    #[arg(long)]
    bind: Option<String>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    tracing::info!("Starting plot host");
    tracing::info!("Loading configuration from: {}", args.config.display());

    let mut config = match config::load_config(&args.config) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("No configuration at '{}', using defaults", args.config.display());
            Config::default()
        }
        Err(e) => {
            tracing::error!("Please ensure the configuration file is properly formatted");
            return Err(e.into());
        }
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    tracing::info!(
        enabled = config.queue.enabled,
        auto_advance = config.queue.auto_advance,
        baseline_settings = config.settings.len(),
        "Queue policy"
    );

    // Device events flow from the plotter and the progress sampler into the host.
    let (events_tx, events_rx) = mpsc::channel(DEVICE_EVENT_BUFFER);
    let device: Arc<dyn PlotterDevice> =
        Arc::new(SimulatedPlotter::new(&config.simulator, events_tx.clone()));

    let (queue, host_task) = start_queue(
        device,
        events_tx,
        events_rx,
        SchedulerOptions::from_config(&config),
        config.server.request_buffer,
    );
    queue.attach_surface(true).await?;

    let app = web::create_router(queue.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    // Closing the last handle lets the host task drain and exit.
    drop(queue);
    let _ = host_task.await;
    Ok(())
}
