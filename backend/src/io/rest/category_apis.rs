//! # REST API for Category Management
//!
//! Endpoints for creating, browsing, updating and deleting categories.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use shared::{CreateCategoryRequest, UpdateCategoryRequest};
use tracing::{error, info};

use super::mappers::{error_response, CategoryMapper};
use crate::domain::CategoryError;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    /// Maximum depth, 0 for the whole tree
    pub deep: Option<u32>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

/// Create a new category
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    info!("POST /api/category - request: {:?}", request);

    let command = CategoryMapper::to_create_command(request);
    match state.category_service.create_category(command).await {
        Ok(category) => (
            StatusCode::CREATED,
            Json(CategoryMapper::to_category_response_dto(
                category,
                "Category created successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to create category: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// List one page of categories ordered by name
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    info!("GET /api/category/list - limit: {}, offset: {}", limit, offset);

    match state.category_service.list_categories(limit, offset).await {
        Ok(page) => (
            StatusCode::OK,
            Json(CategoryMapper::to_list_dto(page, limit, offset)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to list categories: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Categories as a forest, optionally depth-limited and filtered by type
pub async fn get_category_tree(
    State(state): State<AppState>,
    Query(query): Query<TreeQuery>,
) -> impl IntoResponse {
    let deep = query.deep.unwrap_or(0);
    info!("GET /api/category/tree - deep: {}, type: {:?}", deep, query.category_type);

    let result = state
        .category_service
        .category_tree(deep, query.category_type.as_deref())
        .await;
    match result {
        Ok(forest) => (
            StatusCode::OK,
            Json(CategoryMapper::to_tree_dto(forest, deep, query.category_type)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to build category tree: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Get a category by ID
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/category/{}", category_id);

    let result = state.category_service.get_category(&category_id).await;
    match result {
        Ok(Some(category)) => (StatusCode::OK, Json(CategoryMapper::to_dto(category))).into_response(),
        Ok(None) => error_response(&CategoryError::NotFound(category_id)).into_response(),
        Err(e) => {
            error!("Failed to get category: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Get a category by name
pub async fn get_category_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/category/name/{}", name);

    let result = state.category_service.get_category_by_name(&name).await;
    match result {
        Ok(Some(category)) => (StatusCode::OK, Json(CategoryMapper::to_dto(category))).into_response(),
        Ok(None) => error_response(&CategoryError::NotFound(name)).into_response(),
        Err(e) => {
            error!("Failed to get category by name: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// List the direct children of a category
pub async fn list_category_children(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/category/children/{}", parent_id);

    match state.category_service.list_children(&parent_id).await {
        Ok(children) => {
            let children: Vec<_> = children.into_iter().map(CategoryMapper::to_dto).collect();
            (StatusCode::OK, Json(children)).into_response()
        }
        Err(e) => {
            error!("Failed to list category children: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Update a category
pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    info!("PUT /api/category/{} - request: {:?}", category_id, request);

    let command = CategoryMapper::to_update_command(request);
    match state
        .category_service
        .update_category(&category_id, command)
        .await
    {
        Ok(category) => (
            StatusCode::OK,
            Json(CategoryMapper::to_category_response_dto(
                category,
                "Category updated successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update category: {}", e);
            error_response(&e).into_response()
        }
    }
}

/// Delete a category
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/category/{}", category_id);

    match state.category_service.delete_category(&category_id).await {
        Ok(category) => (
            StatusCode::OK,
            Json(CategoryMapper::to_category_response_dto(
                category,
                "Category deleted successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete category: {}", e);
            error_response(&e).into_response()
        }
    }
}
