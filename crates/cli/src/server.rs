//! HTTP API over the workspace: snapshot, listings, file text, previews,
//! downloads, and the failures/funnel feeds.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use dashboard_core::config::AppConfig;
use dashboard_core::content::{ContentError, DirEntryView, Workspace};
use dashboard_core::feeds::FailureRecord;
use dashboard_core::markdown;
use dashboard_core::models::WorkspaceSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type SharedWorkspace = Arc<Workspace>;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub department: Option<String>,
    pub path: Option<String>,
}

impl FileQuery {
    fn department(&self) -> Result<&str, ApiError> {
        self.department
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Department required".to_string()))
    }

    fn file_path(&self) -> Result<&str, ApiError> {
        self.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::BadRequest("File path required".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Content(ContentError),
    Internal(String),
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        ApiError::Content(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Content(e) => {
                let status = match &e {
                    ContentError::UnknownDepartment(_) | ContentError::InvalidPath(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                    ContentError::Read { .. } => {
                        warn!("{}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string())
            }
            ApiError::Internal(m) => {
                warn!("internal error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Filesystem work runs off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

pub fn router(workspace: SharedWorkspace, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/workspace", get(workspace_snapshot))
        .route("/api/files", get(list_files))
        .route("/api/files/content", get(file_content))
        .route("/api/files/preview", get(file_preview))
        .route("/api/files/download", get(download))
        .route("/api/failures", get(failures))
        .route("/api/funnel", get(funnel))
        .with_state(workspace);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(cfg: &AppConfig, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {bind:?}"))?;

    let workspace = Arc::new(Workspace::from_config(&cfg.workspace));
    let app = router(workspace, cfg.server.static_dir.as_deref().map(Path::new));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("Dashboard server running on http://{}", addr);
    info!("API endpoints available at http://{}/api/*", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "timestamp": Utc::now().to_rfc3339() }))
}

/// GET /api/workspace
/// Fresh snapshot on every request.
async fn workspace_snapshot(
    State(ws): State<SharedWorkspace>,
) -> Result<Json<WorkspaceSnapshot>, ApiError> {
    let snapshot = blocking(move || Ok(ws.scan())).await?;
    Ok(Json(snapshot))
}

/// GET /api/failures
async fn failures(State(ws): State<SharedWorkspace>) -> Result<Json<Vec<FailureRecord>>, ApiError> {
    let records = blocking(move || Ok(ws.failures())).await?;
    Ok(Json(records))
}

/// GET /api/funnel
async fn funnel(State(ws): State<SharedWorkspace>) -> Result<Json<serde_json::Value>, ApiError> {
    let metrics = blocking(move || Ok(ws.funnel())).await?;
    Ok(Json(metrics))
}

/// GET /api/files?department=&path=
async fn list_files(
    State(ws): State<SharedWorkspace>,
    Query(q): Query<FileQuery>,
) -> Result<Json<Vec<DirEntryView>>, ApiError> {
    let department = q.department()?.to_string();
    let path = q.path.unwrap_or_default();
    let entries = blocking(move || Ok(ws.list_directory(&department, &path)?)).await?;
    Ok(Json(entries))
}

/// GET /api/files/content?department=&path=
async fn file_content(
    State(ws): State<SharedWorkspace>,
    Query(q): Query<FileQuery>,
) -> Result<Json<ContentResponse>, ApiError> {
    let content = read_text(ws, &q).await?;
    Ok(Json(ContentResponse { content }))
}

/// GET /api/files/preview?department=&path=
async fn file_preview(
    State(ws): State<SharedWorkspace>,
    Query(q): Query<FileQuery>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let content = read_text(ws, &q).await?;
    Ok(Json(PreviewResponse {
        html: markdown::render(&content),
    }))
}

async fn read_text(ws: SharedWorkspace, q: &FileQuery) -> Result<String, ApiError> {
    let department = q.department()?.to_string();
    let path = q.file_path()?.to_string();
    blocking(move || Ok(ws.read_text(&department, &path)?)).await
}

/// GET /api/files/download?department=&path=
/// Streams the file unmodified as an attachment.
async fn download(
    State(ws): State<SharedWorkspace>,
    Query(q): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let department = q.department()?.to_string();
    let path = q.file_path()?.to_string();
    let filename = Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "_"))
        .unwrap_or_else(|| "download".to_string());

    let (file, len) = blocking(move || Ok(ws.open(&department, &path)?)).await?;
    let stream = ReaderStream::new(tokio::fs::File::from_std(file));

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
