//! Search, filter-option and catalogue-number endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use moneta_backend::models::{FilterOptions, Lot, QuerySpec};

use super::ApiResponse;
use crate::state::AppState;

/// An absent or empty source list means "every available source"
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SourcesRequest {
    pub sources: Vec<String>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub spec: QuerySpec,
}

#[derive(Deserialize)]
pub struct CatalogueNumbersRequest {
    #[serde(default)]
    pub sources: Vec<String>,
    pub catalogue_type: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub lots: Vec<Lot>,
    pub total: i64,
    pub total_pages: i64,
}

fn selected_or_all(requested: &[String], state: &AppState) -> Vec<String> {
    if requested.is_empty() {
        state.factory.available_sources().to_vec()
    } else {
        requested.to_vec()
    }
}

/// Page count for a total under a page size; no limit means one page
fn total_pages(total: i64, limit: Option<i64>) -> i64 {
    match limit {
        Some(size) if size > 0 => (total + size - 1) / size,
        _ => 1,
    }
}

pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(
        state.factory.available_sources().to_vec(),
    ))
}

pub async fn filter_options(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SourcesRequest>,
) -> Json<ApiResponse<FilterOptions>> {
    let selected = selected_or_all(&req.sources, &state);
    let options = state.factory.combined_filter_options(&selected).await;
    Json(ApiResponse::success(options))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let selected = selected_or_all(&req.sources, &state);
    let lots = state.factory.combined_data(&selected, &req.spec).await;
    let total = state.factory.combined_total_count(&selected, &req.spec).await;

    Json(ApiResponse::success(SearchResponse {
        lots,
        total,
        total_pages: total_pages(total, req.spec.limit),
    }))
}

pub async fn catalogue_numbers(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CatalogueNumbersRequest>,
) -> Json<ApiResponse<Vec<String>>> {
    let selected = selected_or_all(&req.sources, &state);
    let numbers = state
        .factory
        .available_catalogue_numbers(&selected, &req.catalogue_type)
        .await;
    Json(ApiResponse::success(numbers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, Some(20)), 0);
        assert_eq!(total_pages(1, Some(20)), 1);
        assert_eq!(total_pages(20, Some(20)), 1);
        assert_eq!(total_pages(21, Some(20)), 2);
        assert_eq!(total_pages(100, None), 1);
        assert_eq!(total_pages(100, Some(0)), 1);
    }
}
