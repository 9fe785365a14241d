//! File API: listing, metadata, reads, uploads, and mutations.
//!
//! Every handler first validates the session, then routes the caller's path
//! through the vault, which performs confinement resolution before any
//! filesystem access.

use std::path::Path;

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};
use vault::{DirEntry, FileInfo, VaultError};

use super::error::{ApiError, ApiResult};
use super::SharedState;

/// Query parameter carrying the candidate path. Defaults to the home root.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

/// Rename request body.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub old_path: String,
    pub new_path: String,
}

/// GET /api/files
pub async fn list(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<Vec<DirEntry>>> {
    state.require_session(&headers)?;
    let entries = state.vault.list(&query.path)?;
    Ok(Json(entries))
}

/// GET /api/files/info
pub async fn info(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<FileInfo>> {
    state.require_session(&headers)?;
    let info = state.vault.info(&query.path)?;
    Ok(Json(info))
}

/// GET /api/files/content
pub async fn content(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Response> {
    state.require_session(&headers)?;
    let file = state.vault.file_path(&query.path)?;
    stream_file(&file, &query.path, false).await
}

/// GET /api/files/download
pub async fn download(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Response> {
    state.require_session(&headers)?;
    let file = state.vault.file_path(&query.path)?;
    stream_file(&file, &query.path, true).await
}

/// POST /api/files/upload
pub async fn upload(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    state.require_session(&headers)?;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        debug!(error = %e, "malformed multipart body");
        ApiError::internal()
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let client_name = field.file_name().unwrap_or_default().to_string();
        let mut sink =
            state
                .vault
                .start_upload(&query.path, &client_name, state.upload_max_size)?;

        while let Some(chunk) = field.chunk().await.map_err(|e| {
            debug!(error = %e, "upload stream aborted");
            ApiError::internal()
        })? {
            sink.write(&chunk)?;
        }

        let done = sink.finish()?;
        debug!(name = %done.name, size = done.size, "upload complete");
        return Ok(Json(json!({"name": done.name, "size": done.size})));
    }

    Err(ApiError::invalid_filename("No file provided"))
}

/// POST /api/files/mkdir
pub async fn mkdir(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    state.require_session(&headers)?;
    let rel = state.vault.mkdir(&query.path)?;
    Ok(Json(json!({"path": rel.to_string_lossy()})))
}

/// PUT /api/files/rename
pub async fn rename(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<RenameRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.require_session(&headers)?;
    let rel = state.vault.rename(&body.old_path, &body.new_path)?;
    Ok(Json(json!({"path": rel.to_string_lossy()})))
}

/// DELETE /api/files
pub async fn delete(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    state.require_session(&headers)?;
    state.vault.delete(&query.path)?;
    Ok(Json(json!({"ok": true})))
}

/// Streams an already-confined file as the response body.
async fn stream_file(file: &Path, candidate: &str, attachment: bool) -> ApiResult<Response> {
    let handle = tokio::fs::File::open(file).await.map_err(|e| {
        // The path was validated a moment ago; losing a race to a delete is
        // an expected NOT_FOUND, anything else is internal.
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::from(VaultError::NotFound {
                path: candidate.to_string(),
            })
        } else {
            error!(error = %e, "failed to open file for streaming");
            ApiError::internal()
        }
    })?;

    let stream = ReaderStream::new(handle);
    let mut response = Body::from_stream(stream).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );

    if attachment {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().replace(['"', '\r', '\n'], "_"))
            .unwrap_or_else(|| "download".to_string());
        let disposition = format!("attachment; filename=\"{name}\"");
        response.headers_mut().insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition).map_err(|_| ApiError::internal())?,
        );
    }

    Ok(response)
}
