pub mod images;
pub mod lots;

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            code: 400,
            message: message.to_string(),
            data: None,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sources", get(lots::list_sources))
        .route("/api/filter-options", post(lots::filter_options))
        .route("/api/lots/search", post(lots::search))
        .route("/api/lots/images", post(images::lot_images))
        .route("/api/catalogue-numbers", post(lots::catalogue_numbers))
        .route("/api/image", get(images::image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
