//! HTTP front end: `POST /upload` plus static files.

use crate::file_utils::{DocumentFormat, sanitize_file_name};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

const NO_FILE: &str = "No file uploaded.";

/// Server settings, read from `PAGE_COUNTER_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (`PAGE_COUNTER_ADDR`).
    pub addr: String,
    /// Where uploads are stored (`PAGE_COUNTER_UPLOAD_DIR`); created on startup.
    pub upload_dir: PathBuf,
    /// Served for every path other than the API routes (`PAGE_COUNTER_PUBLIC_DIR`).
    pub public_dir: PathBuf,
    /// Largest accepted request body (`PAGE_COUNTER_MAX_UPLOAD_BYTES`).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Variables
    ///
    /// * `PAGE_COUNTER_ADDR` - bind address (default `0.0.0.0:3000`)
    /// * `PAGE_COUNTER_UPLOAD_DIR` - upload directory (default `uploads`)
    /// * `PAGE_COUNTER_PUBLIC_DIR` - static file directory (default `public`)
    /// * `PAGE_COUNTER_MAX_UPLOAD_BYTES` - body limit in bytes (default 50 MiB)
    ///
    /// Unset variables keep their default. A body limit that is not a valid
    /// number also keeps the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source, such as
    /// [`std::env::var`].
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of a `PAGE_COUNTER_*` variable, or
    ///   `None` when it is unset.
    ///
    /// # Returns
    ///
    /// The configuration with defaults for every missing or invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            addr: lookup("PAGE_COUNTER_ADDR").unwrap_or(defaults.addr),
            upload_dir: lookup("PAGE_COUNTER_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_dir: lookup("PAGE_COUNTER_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            max_upload_bytes: lookup("PAGE_COUNTER_MAX_UPLOAD_BYTES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Filename as sent by the client.
    pub file: String,
    pub pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the router with all endpoints
///
/// `POST /upload` and `GET /health` are routed explicitly; every other path
/// is served from `config.public_dir`. Request bodies are capped at
/// `config.max_upload_bytes`.
pub fn build_router(config: ServerConfig) -> Router {
    let public = ServeDir::new(&config.public_dir);
    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload))
        .fallback_service(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            config: Arc::new(config),
        })
}

/// Create the upload directory and serve until the listener fails.
pub async fn start_server(config: ServerConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    info!(
        addr = %config.addr,
        upload_dir = %config.upload_dir.display(),
        public_dir = %config.public_dir.display(),
        "Starting page counter server"
    );

    let listener = tokio::net::TcpListener::bind(config.addr.as_str()).await?;
    axum::serve(listener, build_router(config)).await
}

/// Liveness check.
///
/// # Returns
///
/// `200` with `{"status": "ok", "version": <crate version>}`.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn processing_error(err: impl Display) -> (StatusCode, String) {
    error!("Error processing file: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Error processing file: {err}"),
    )
}

fn no_file() -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, NO_FILE.to_string())
}

/// Store the `file` field of a multipart upload and report its page count.
///
/// # Returns
///
/// * `200` with [`UploadResponse`] on success
/// * `400 No file uploaded.` when the request is not multipart or carries no
///   named `file` field
/// * `500 Error processing file: <reason>` for storage, body limit and
///   estimation failures
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let Ok(mut multipart) = multipart else {
        return Err(no_file());
    };

    let (filename, data) = loop {
        let Some(field) = multipart.next_field().await.map_err(processing_error)? else {
            return Err(no_file());
        };
        if field.name() != Some("file") {
            continue;
        }
        // browsers send `filename=""` when no file was chosen
        let Some(filename) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        let data = field.bytes().await.map_err(processing_error)?;
        break (filename, data);
    };

    let stored = state.config.upload_dir.join(format!(
        "{}-{}",
        Uuid::new_v4(),
        sanitize_file_name(&filename)
    ));
    tokio::fs::write(&stored, &data)
        .await
        .map_err(|e| processing_error(format!("could not store {}: {e}", stored.display())))?;
    info!(file = %filename, stored = %stored.display(), size = data.len(), "upload stored");

    let declared = filename.clone();
    let estimate = tokio::task::spawn_blocking(move || {
        let format = DocumentFormat::from_filename(&declared)?;
        crate::estimate(&stored, format)
    })
    .await
    .map_err(processing_error)?
    .map_err(processing_error)?;

    info!(file = %filename, pages = estimate.pages, method = ?estimate.method, "pages counted");
    Ok(Json(UploadResponse {
        file: filename,
        pages: estimate.pages,
    }))
}
