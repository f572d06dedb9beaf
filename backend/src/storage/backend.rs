//! Backend selection.
//!
//! The concrete storage engine is picked once at startup from configuration
//! and never changes for the life of the process.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::document::{DocumentCategoryRepository, DocumentConnection};
use super::sqlite::{DbConnection, SqliteCategoryRepository};
use super::traits::{CategoryReferenceCounter, CategoryStorage};
use crate::config::{StorageConfig, StorageKind};
use crate::domain::models::{Category, DeleteOutcome, NewCategory};

/// The closed set of storage engines
#[derive(Clone)]
pub enum StorageBackend {
    Document(DocumentCategoryRepository),
    Sqlite(SqliteCategoryRepository),
}

impl StorageBackend {
    /// Open the backend selected by `config`
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        match config.kind {
            StorageKind::Document => {
                info!(path = ?config.document_path, "Using document storage");
                let connection = DocumentConnection::new(&config.document_path)?;
                Ok(Self::Document(DocumentCategoryRepository::new(connection)))
            }
            StorageKind::Sqlite => {
                info!(url = %config.sqlite_url, "Using SQLite storage");
                let db = DbConnection::new(&config.sqlite_url).await?;
                Ok(Self::Sqlite(SqliteCategoryRepository::new(db)))
            }
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Document(_) => StorageKind::Document,
            Self::Sqlite(_) => StorageKind::Sqlite,
        }
    }

    fn storage(&self) -> &dyn CategoryStorage {
        match self {
            Self::Document(repo) => repo,
            Self::Sqlite(repo) => repo,
        }
    }

    fn references(&self) -> &dyn CategoryReferenceCounter {
        match self {
            Self::Document(repo) => repo,
            Self::Sqlite(repo) => repo,
        }
    }
}

#[async_trait]
impl CategoryStorage for StorageBackend {
    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.storage().get_category(id).await
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.storage().get_category_by_name(name).await
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Category>> {
        self.storage().list_children(parent_id).await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<String> {
        self.storage().insert_category(category).await
    }

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Option<Category>> {
        self.storage().update_category(id, category).await
    }

    async fn delete_category(&self, id: &str) -> Result<DeleteOutcome> {
        self.storage().delete_category(id).await
    }

    async fn list_categories(&self, limit: u32, offset: u32) -> Result<Vec<Category>> {
        self.storage().list_categories(limit, offset).await
    }

    async fn count_categories(&self) -> Result<i64> {
        self.storage().count_categories().await
    }

    async fn truncate_categories(&self) -> Result<()> {
        self.storage().truncate_categories().await
    }
}

#[async_trait]
impl CategoryReferenceCounter for StorageBackend {
    async fn count_records_referencing_category(&self, category_id: &str) -> Result<i64> {
        self.references()
            .count_records_referencing_category(category_id)
            .await
    }
}
