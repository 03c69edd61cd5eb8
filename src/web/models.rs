//! Contains the data models for API requests and responses.

use serde::{Deserialize, Serialize};

use crate::queue::job::{job_uri, Job};
use crate::web::queue_channel::NewJob;

/// Body of `POST /print`: either a new drawing or a readiness toggle.
#[derive(Debug, Default, Deserialize)]
pub struct PrintPostRequest {
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub options: Option<PrintOptions>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// Per-job options of a creation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub settings_overrides: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, alias = "noresize")]
    pub no_resize: bool,
}

impl PrintPostRequest {
    /// A body with `ready` and no `options` toggles readiness.
    pub fn ready_toggle(&self) -> Option<bool> {
        if self.options.is_none() { self.ready } else { None }
    }

    pub fn into_new_job(self) -> NewJob {
        let options_missing = self.options.is_none();
        let options = self.options.unwrap_or_default();
        NewJob {
            name: options.name.unwrap_or_default(),
            payload: self.svg.unwrap_or_default(),
            settings_overrides: options.settings_overrides.unwrap_or_default(),
            no_resize: options.no_resize,
            options_missing,
        }
    }
}

/// Response of a successful creation.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub id: u64,
    pub uri: String,
    pub item: Job,
}

impl CreatedResponse {
    pub fn new(item: Job) -> Self {
        Self {
            status: "verified and added to queue",
            id: item.id,
            uri: job_uri(item.id),
            item,
        }
    }
}

/// Response of a readiness toggle.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}
