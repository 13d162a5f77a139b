//! Image resolution and serving
//!
//! Lots reference images either as local files under the data directory
//! or as remote URLs. Remote images are proxied so the browser never
//! talks to the auction houses directly; local paths are confined to the
//! data directory.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use moneta_backend::config;
use moneta_backend::models::Lot;

use super::ApiResponse;
use crate::state::AppState;

pub async fn lot_images(
    State(state): State<Arc<AppState>>,
    Json(lot): Json<Lot>,
) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(state.factory.lot_images(&lot).await))
}

#[derive(Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
    pub path: Option<String>,
}

pub async fn image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageQuery>,
) -> Response {
    if let Some(url) = query.url.as_deref() {
        return proxy_remote(&state, url).await;
    }
    if let Some(path) = query.path.as_deref() {
        return serve_local(Path::new(path)).await;
    }
    (StatusCode::BAD_REQUEST, "url or path required").into_response()
}

async fn proxy_remote(state: &AppState, url: &str) -> Response {
    match state.images.fetch(url).await {
        Some(bytes) => {
            let mime = mime_guess::from_path(url).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(bytes))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        None => (StatusCode::NOT_FOUND, "image not available").into_response(),
    }
}

async fn serve_local(path: &Path) -> Response {
    let Some(resolved) = confine_to_data_dir(path) else {
        return (StatusCode::FORBIDDEN, "path outside data directory").into_response();
    };

    match tokio::fs::read(&resolved).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&resolved).first_or_octet_stream();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(bytes))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(_) => (StatusCode::NOT_FOUND, "image not found").into_response(),
    }
}

/// Canonicalize and require the result to stay under the data directory.
/// Rejects traversal like `../../etc/passwd`.
fn confine_to_data_dir(path: &Path) -> Option<PathBuf> {
    let data_dir = config::config().get_data_dir().canonicalize().ok()?;
    let resolved = path.canonicalize().ok()?;
    if resolved.starts_with(&data_dir) {
        Some(resolved)
    } else {
        None
    }
}
