//! # Plot Host Configuration
//!
//! Single TOML file describing the HTTP listener, queue policy, the operator's
//! baseline render settings and the built-in plotter simulator.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:4242"
//!
//! [queue]
//! enabled = true
//! auto_advance = false
//! progress_interval_ms = 1500
//!
//! [settings]
//! fillspacing = 10
//! filltype = "zigzag"
//!
//! [simulator]
//! steps = 40
//! step_ms = 250
//! ```
//!
//! Every section is optional; missing keys fall back to the defaults below.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the plot host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    /// Baseline render settings, the base every job's overrides merge onto.
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_buffer")]
    pub request_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_buffer: default_request_buffer(),
        }
    }
}

/// Queue policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Whether the queue accepts mutating requests at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Keep readiness armed after a job completes and move straight on.
    #[serde(default)]
    pub auto_advance: bool,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_advance: false,
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// Simulated plotter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_sim_steps")]
    pub steps: u64,
    #[serde(default = "default_sim_step_ms")]
    pub step_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            steps: default_sim_steps(),
            step_ms: default_sim_step_ms(),
        }
    }
}

impl Config {
    /// Reject values that would stall the host at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.request_buffer == 0 {
            return Err(ConfigError::Invalid("server.request_buffer must be > 0".to_string()));
        }
        if self.queue.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid("queue.progress_interval_ms must be > 0".to_string()));
        }
        if self.simulator.steps == 0 {
            return Err(ConfigError::Invalid("simulator.steps must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_bind() -> String { "0.0.0.0:4242".to_string() }
fn default_request_buffer() -> usize { 32 }
fn default_progress_interval_ms() -> u64 { 1500 }
fn default_sim_steps() -> u64 { 40 }
fn default_sim_step_ms() -> u64 { 250 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
