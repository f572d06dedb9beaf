//! # Cached Category Store
//!
//! Decorator between the domain services and the storage backend.
//!
//! ## Key Responsibilities
//!
//! - **Read-through**: lookups by ID and by name consult the cache first and
//!   populate it from the backend on a miss
//! - **Invalidation**: every confirmed mutation clears the whole cache before
//!   the call returns; failed mutations leave it alone
//! - **Freshness**: a read-miss only stores its result if no invalidation
//!   happened while it was at the backend
//! - **Deadlines**: every backend call is bounded by the configured timeout
//!
//! Backends know nothing about caching; this is the only place the
//! invalidation policy lives.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::backend::StorageBackend;
use super::traits::{CategoryReferenceCounter, CategoryStorage};
use crate::cache::CategoryCache;
use crate::domain::models::{Category, DeleteOutcome, NewCategory};

/// A backend call did not finish within its deadline
#[derive(Debug, thiserror::Error)]
#[error("storage operation '{operation}' timed out after {timeout:?}")]
pub struct StorageTimeout {
    pub operation: &'static str,
    pub timeout: Duration,
}

/// Cache-aware wrapper around a storage backend
#[derive(Clone)]
pub struct CachedCategoryStore<S = StorageBackend> {
    backend: S,
    cache: Arc<CategoryCache>,
    timeout: Duration,
}

impl<S> CachedCategoryStore<S>
where
    S: CategoryStorage + CategoryReferenceCounter,
{
    pub fn new(backend: S, cache: Arc<CategoryCache>, timeout: Duration) -> Self {
        Self {
            backend,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &Arc<CategoryCache> {
        &self.cache
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "Storage call timed out");
                Err(StorageTimeout {
                    operation,
                    timeout: self.timeout,
                }
                .into())
            }
        }
    }

    /// Run a mutation under the deadline and clear the cache when `applied`
    /// says it took effect. A timed-out mutation may have been applied, so it
    /// clears too.
    async fn mutate<T, F>(&self, operation: &'static str, call: F, applied: fn(&T) -> bool) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = self.bounded(operation, call).await;
        match &result {
            Ok(value) if applied(value) => self.cache.clear(),
            Ok(_) => debug!(operation, "Mutation had no effect, cache kept"),
            Err(e) if e.is::<StorageTimeout>() => self.cache.clear(),
            Err(_) => {}
        }
        result
    }
}

#[async_trait]
impl<S> CategoryStorage for CachedCategoryStore<S>
where
    S: CategoryStorage + CategoryReferenceCounter,
{
    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        if let Some(category) = self.cache.get_by_id(id) {
            return Ok(Some(category));
        }

        let generation = self.cache.generation();
        let found = self
            .bounded("get_category", self.backend.get_category(id))
            .await?;
        if let Some(category) = &found {
            self.cache.set_if_generation(category, generation);
        }
        Ok(found)
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        if let Some(category) = self.cache.get_by_name(name) {
            return Ok(Some(category));
        }

        let generation = self.cache.generation();
        let found = self
            .bounded("get_category_by_name", self.backend.get_category_by_name(name))
            .await?;
        if let Some(category) = &found {
            self.cache.set_if_generation(category, generation);
        }
        Ok(found)
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Category>> {
        self.bounded("list_children", self.backend.list_children(parent_id))
            .await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<String> {
        self.mutate(
            "insert_category",
            self.backend.insert_category(category),
            |_| true,
        )
        .await
    }

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Option<Category>> {
        self.mutate(
            "update_category",
            self.backend.update_category(id, category),
            Option::is_some,
        )
        .await
    }

    async fn delete_category(&self, id: &str) -> Result<DeleteOutcome> {
        self.mutate(
            "delete_category",
            self.backend.delete_category(id),
            |outcome| matches!(outcome, DeleteOutcome::Deleted(_)),
        )
        .await
    }

    async fn list_categories(&self, limit: u32, offset: u32) -> Result<Vec<Category>> {
        self.bounded("list_categories", self.backend.list_categories(limit, offset))
            .await
    }

    async fn count_categories(&self) -> Result<i64> {
        self.bounded("count_categories", self.backend.count_categories())
            .await
    }

    async fn truncate_categories(&self) -> Result<()> {
        self.mutate(
            "truncate_categories",
            self.backend.truncate_categories(),
            |_| true,
        )
        .await
    }
}

#[async_trait]
impl<S> CategoryReferenceCounter for CachedCategoryStore<S>
where
    S: CategoryStorage + CategoryReferenceCounter,
{
    async fn count_records_referencing_category(&self, category_id: &str) -> Result<i64> {
        self.bounded(
            "count_records_referencing_category",
            self.backend.count_records_referencing_category(category_id),
        )
        .await
    }
}
