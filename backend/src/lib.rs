//! # Cashbook Backend
//!
//! Category subsystem of the cashbook personal-finance tracker.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (CategoryService, tree builder)
//!     ↓
//! CachedCategoryStore (read-through cache, invalidation, deadlines)
//!     ↓
//! StorageBackend (document store | SQLite)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Resolve configuration and pick the storage backend once at startup
//! - Construct the shared category cache and inject it into the services
//! - Set up the REST router with CORS

pub mod cache;
pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::cache::CategoryCache;
use crate::config::AppConfig;
use crate::domain::CategoryService;
use crate::storage::{CachedCategoryStore, StorageBackend};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub category_service: CategoryService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!(kind = %config.storage.kind, "Setting up storage");
    let backend = StorageBackend::connect(&config.storage).await?;

    info!(enabled = config.cache_enabled, "Setting up category cache");
    let cache = Arc::new(CategoryCache::new(config.cache_enabled));
    let store = CachedCategoryStore::new(backend, cache, config.storage.timeout());

    info!("Setting up application state");
    Ok(AppState {
        category_service: CategoryService::new(store),
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost:8080"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/category", post(io::create_category))
        .route("/category/list", get(io::list_categories))
        .route("/category/tree", get(io::get_category_tree))
        .route("/category/name/:name", get(io::get_category_by_name))
        .route("/category/children/:parent_id", get(io::list_category_children))
        .route(
            "/category/:id",
            get(io::get_category)
                .put(io::update_category)
                .delete(io::delete_category),
        )
        .route("/cache/category/stats", get(io::get_cache_stats))
        .route("/cache/category/enable", post(io::enable_cache))
        .route("/cache/category/disable", post(io::disable_cache))
        .route("/cache/category/clear", post(io::clear_cache));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageKind;
    use crate::storage::test_utils::{seed_cash_flow, TestBackend};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn setup() -> (Router, TestBackend) {
        let test = TestBackend::new(StorageKind::Document).await;
        let config = AppConfig {
            storage: test.config.clone(),
            cache_enabled: true,
            port: 0,
            log_filter: "info".to_string(),
        };
        let state = initialize_backend(&config).await.unwrap();
        (create_router(state), test)
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, name: &str, parent_id: Option<&str>) -> String {
        let (status, body) = send(
            router,
            "POST",
            "/api/category",
            Some(json!({ "parent_id": parent_id, "name": name, "type": "expense" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["category"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (router, _test) = setup().await;
        let id = create(&router, "Food", None).await;

        let (status, body) = send(&router, "GET", &format!("/api/category/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Food");
        assert_eq!(body["type"], "expense");

        let (status, body) = send(&router, "GET", "/api/category/name/Food", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());

        let (status, body) = send(&router, "GET", "/api/category/name/Nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_requests() {
        let (router, _test) = setup().await;

        let (status, body) = send(
            &router,
            "POST",
            "/api/category",
            Some(json!({ "name": "Food", "type": "loan" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(&router, "GET", "/api/category/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_conflicts() {
        let (router, test) = setup().await;
        let food = create(&router, "Food", None).await;
        let groceries = create(&router, "Groceries", Some(&food)).await;

        let (status, body) = send(&router, "DELETE", &format!("/api/category/{}", food), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "has_children");

        seed_cash_flow(&test, &groceries, 4.5).await;
        let (status, body) =
            send(&router, "DELETE", &format!("/api/category/{}", groceries), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "has_references");

        let other = create(&router, "Travel", None).await;
        let (status, body) = send(&router, "DELETE", &format!("/api/category/{}", other), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["name"], "Travel");
    }

    #[tokio::test]
    async fn test_update_list_children_and_tree() {
        let (router, _test) = setup().await;
        let food = create(&router, "Food", None).await;
        let groceries = create(&router, "Groceries", Some(&food)).await;
        create(&router, "Dining", Some(&food)).await;

        let (status, body) = send(
            &router,
            "PUT",
            &format!("/api/category/{}", groceries),
            Some(json!({ "remark": "weekly" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["remark"], "weekly");

        let (status, body) =
            send(&router, "GET", &format!("/api/category/children/{}", food), None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Dining", "Groceries"]);

        let (status, body) = send(&router, "GET", "/api/category/list?limit=2&offset=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 3);
        assert_eq!(body["categories"].as_array().unwrap().len(), 2);

        let (status, body) = send(&router, "GET", "/api/category/tree?deep=0&type=expense", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "Food");
        assert_eq!(body["data"][0]["children"].as_array().unwrap().len(), 2);
        assert_eq!(body["type"], "expense");
    }

    #[tokio::test]
    async fn test_cache_endpoints() {
        let (router, _test) = setup().await;
        create(&router, "Food", None).await;

        let (status, body) = send(&router, "GET", "/api/cache/category/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], true);
        assert_eq!(body["size"], 1);

        let (_, body) = send(&router, "POST", "/api/cache/category/clear", None).await;
        assert_eq!(body["size"], 0);

        let (_, body) = send(&router, "POST", "/api/cache/category/disable", None).await;
        assert_eq!(body["enabled"], false);

        let (_, body) = send(&router, "POST", "/api/cache/category/enable", None).await;
        assert_eq!(body["enabled"], true);
    }
}
