//! # REST API for Cache Administration
//!
//! Operational endpoints for the category cache. Every endpoint answers with
//! the cache stats after the action.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::mappers::CategoryMapper;
use crate::AppState;

fn stats_response(state: &AppState) -> impl IntoResponse {
    let stats = state.category_service.cache_stats();
    (StatusCode::OK, Json(CategoryMapper::to_cache_stats_dto(stats)))
}

pub async fn get_cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/cache/category/stats");
    stats_response(&state)
}

pub async fn enable_cache(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/cache/category/enable");
    state.category_service.enable_cache();
    stats_response(&state)
}

pub async fn disable_cache(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/cache/category/disable");
    state.category_service.disable_cache();
    stats_response(&state)
}

pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/cache/category/clear");
    state.category_service.clear_cache();
    stats_response(&state)
}
