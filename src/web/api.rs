//! Defines the Axum API routes and handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::error::QueueError;
use crate::queue::QueueHandle;
use crate::web::models::{CreatedResponse, PrintPostRequest, ReadyResponse};

pub type AppState = QueueHandle;

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Status code each queue error is reported with.
pub fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::Validation(_) => StatusCode::NOT_ACCEPTABLE,
        QueueError::Forbidden => StatusCode::FORBIDDEN,
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
        QueueError::InvalidStateTransition { .. } => StatusCode::NOT_ACCEPTABLE,
        QueueError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        QueueError::HostStopped => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        json_error(&self.to_string(), status_for(&self))
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(queue: QueueHandle) -> Router {
    Router::new()
        .route("/print", get(list_queue).post(post_print))
        .route("/print/{id}", get(get_item).delete(cancel_item))
        .with_state(queue)
}

/// GET /print
async fn list_queue(State(queue): State<AppState>) -> Response {
    match queue.list().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /print -- queue a drawing, or toggle readiness with `{"ready": bool}`
async fn post_print(
    State(queue): State<AppState>,
    payload: Result<Json<PrintPostRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected print request body: {}", rejection.body_text());
            return json_error(&rejection.body_text(), StatusCode::NOT_ACCEPTABLE);
        }
    };
    if let Some(ready) = payload.ready_toggle() {
        return match queue.set_ready(ready).await {
            Ok(ready) => (StatusCode::OK, Json(ReadyResponse { ready })).into_response(),
            Err(e) => e.into_response(),
        };
    }

    match queue.create(payload.into_new_job()).await {
        Ok(item) => (StatusCode::CREATED, Json(CreatedResponse::new(item))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /print/{id}
async fn get_item(State(queue): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return json_error(&format!("Queue ID {} not found", id), StatusCode::NOT_FOUND);
    };
    match queue.get(id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// DELETE /print/{id}
async fn cancel_item(State(queue): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(parsed) = parse_id(&id) else {
        // A malformed id can never name a job, but a disabled queue still wins.
        return match queue.list().await {
            Ok(snapshot) if !snapshot.enabled => QueueError::Forbidden.into_response(),
            Ok(_) => json_error(&format!("Queue ID {} not found", id), StatusCode::NOT_FOUND),
            Err(e) => e.into_response(),
        };
    };
    match queue.cancel(parsed).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}
