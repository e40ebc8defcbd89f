//! HTTP server: upload a document, then stream its analysis.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload` | Multipart upload (field `file`), returns `{"task_id": ...}` |
//! | `GET`  | `/analyze_stream/{task_id}` | Server-sent events for one run |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Event stream
//!
//! ```text
//! event: progress   data: {"step": "...", "progress": 53}
//! event: result     data: { ...aggregated report... }
//! event: done       data: complete
//! event: error      data: <message>
//! ```
//!
//! A task id can be streamed once. Unknown, running, or finished ids get a
//! single `error` event with `Invalid Task ID`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "No file uploaded" } }
//! ```

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::analyzers::create_analyzers;
use crate::config::Config;
use crate::models::PipelineEvent;
use crate::pipeline::{Pipeline, RunSource};
use crate::registry::TaskRegistry;

pub const INVALID_TASK_ID: &str = "Invalid Task ID";
const UPLOAD_FIELD: &str = "file";
/// Multipart framing overhead allowed on top of the file size limit.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: TaskRegistry,
    pub pipeline: Arc<Pipeline>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(config: &Config, pipeline: Arc<Pipeline>) -> Self {
        Self {
            registry: TaskRegistry::new(),
            pipeline,
            upload_dir: config.uploads.dir.clone(),
            max_upload_bytes: config.uploads.max_file_size_bytes(),
        }
    }
}

/// Build the router. Exposed separately from [`run_server`] for tests.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = usize::try_from(state.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/analyze_stream/{task_id}", get(handle_analyze_stream))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let analyzers = create_analyzers(config)?;
    let pipeline = Arc::new(Pipeline::new(config, analyzers));
    let state = AppState::new(config, pipeline);
    if config.uploads.pending_ttl_secs > 0 {
        spawn_upload_sweeper(
            state.registry.clone(),
            Duration::from_secs(config.uploads.pending_ttl_secs),
        );
    }
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, uploads = %config.uploads.dir.display(), "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete uploads nobody opened a stream for within `ttl`.
fn spawn_upload_sweeper(registry: TaskRegistry, ttl: Duration) {
    let max_age = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    let period = (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(300));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            registry.purge_pending(max_age).await;
        }
    });
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %format!("{:#}", e), "request failed");
                "Failed to save file".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    task_id: Uuid,
}

/// Keep the final path component and replace anything outside
/// `[A-Za-z0-9._-]` so uploads cannot escape the upload directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(sanitize_file_name).unwrap_or_default();
        if file_name.is_empty() {
            return Err(AppError::BadRequest("Invalid file name".into()));
        }

        let bytes = field.bytes().await?;
        if bytes.len() as u64 > state.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds {} byte limit",
                state.max_upload_bytes
            )));
        }

        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(anyhow::Error::from)?;
        let path = state
            .upload_dir
            .join(format!("{}-{}", Uuid::new_v4(), file_name));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| anyhow::anyhow!("write {}: {}", path.display(), e))?;

        let task_id = state.registry.insert(path.clone());
        tracing::info!(%task_id, path = %path.display(), size = bytes.len(), "file uploaded");
        return Ok(Json(UploadResponse { task_id }));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}

// ============ GET /analyze_stream/{task_id} ============

/// Convert a pipeline event to its SSE frame.
///
/// A payload that fails to serialize is reported as a progress event at the
/// last progress value instead.
fn to_sse_event(event: PipelineEvent, last_progress: &mut u8) -> Event {
    let payload = match &event {
        PipelineEvent::Progress(p) => {
            *last_progress = p.progress;
            serde_json::to_string(p)
        }
        PipelineEvent::Result(result) => serde_json::to_string(result),
        PipelineEvent::Done => return Event::default().event("done").data("complete"),
        PipelineEvent::Error(message) => {
            return Event::default()
                .event("error")
                .data(message.replace('\r', ""))
        }
    };

    match payload {
        Ok(json) => Event::default().event(event.name()).data(json),
        Err(e) => {
            tracing::warn!(event = event.name(), error = %e, "failed to serialize event");
            let fallback = serde_json::json!({
                "step": format!("{} event could not be serialized: {}", event.name(), e),
                "progress": *last_progress,
            });
            Event::default().event("progress").data(fallback.to_string())
        }
    }
}

async fn handle_analyze_stream(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let claimed = match Uuid::parse_str(&task_id) {
        Ok(id) => state.registry.claim(&id).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let events = match claimed {
        Ok(guard) => {
            tracing::info!(task_id = %guard.id(), "analysis stream opened");
            Some(state.pipeline.spawn(RunSource::Upload(guard)))
        }
        Err(reason) => {
            tracing::warn!(task_id = %task_id, reason = %reason, "rejected stream request");
            None
        }
    };

    let stream = async_stream::stream! {
        match events {
            None => {
                yield Ok(Event::default().event("error").data(INVALID_TASK_ID));
            }
            Some(mut events) => {
                // The run task closes the channel after its terminal event
                // and after releasing the upload.
                let mut last_progress = 0u8;
                while let Some(event) = events.recv().await {
                    yield Ok(to_sse_event(event, &mut last_progress));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
