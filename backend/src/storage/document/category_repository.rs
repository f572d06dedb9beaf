use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::connection::{DocumentConnection, CASH_FLOWS, CATEGORIES};
use crate::domain::models::{Category, DeleteOutcome, NewCategory};
use crate::storage::traits::{CategoryReferenceCounter, CategoryStorage};

/// Fields of a cash flow document this core cares about
#[derive(Debug, Deserialize)]
struct CashFlowReference {
    category_id: String,
}

/// Document-store category repository: one YAML document per category
#[derive(Clone)]
pub struct CategoryRepository {
    connection: DocumentConnection,
}

impl CategoryRepository {
    pub fn new(connection: DocumentConnection) -> Self {
        Self { connection }
    }

    async fn load_all(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.connection.read_collection(CATEGORIES).await?;
        categories.sort_by(Category::listing_order);
        Ok(categories)
    }
}

#[async_trait]
impl CategoryStorage for CategoryRepository {
    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.connection.read_document(CATEGORIES, id).await
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let categories: Vec<Category> = self.connection.read_collection(CATEGORIES).await?;
        Ok(categories
            .into_iter()
            .filter(|category| category.name == name)
            .min_by(|a, b| a.id.cmp(&b.id)))
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Category>> {
        let children = self
            .load_all()
            .await?
            .into_iter()
            .filter(|category| category.parent_id.as_deref() == Some(parent_id))
            .collect();
        Ok(children)
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<String> {
        let _guard = self.connection.lock_writes().await;

        let id = Category::generate_id();
        let stored = Category::from_new(id.clone(), category, Utc::now());
        self.connection.write_document(CATEGORIES, &id, &stored).await?;

        debug!(id = %id, name = %stored.name, "Inserted category document");
        Ok(id)
    }

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Option<Category>> {
        let _guard = self.connection.lock_writes().await;

        let Some(existing) = self.get_category(id).await? else {
            info!(id, "Category does not exist, nothing to update");
            return Ok(None);
        };

        let updated = existing.with_fields(category, Utc::now());
        self.connection.write_document(CATEGORIES, id, &updated).await?;

        debug!(id, name = %updated.name, "Updated category document");
        Ok(Some(updated))
    }

    async fn delete_category(&self, id: &str) -> Result<DeleteOutcome> {
        let _guard = self.connection.lock_writes().await;

        let Some(existing) = self.get_category(id).await? else {
            info!(id, "Category does not exist, nothing to delete");
            return Ok(DeleteOutcome::NotFound);
        };

        if !self.list_children(id).await?.is_empty() {
            info!(id, "Refusing to delete a category that has child categories");
            return Ok(DeleteOutcome::HasChildren);
        }

        if !self.connection.remove_document(CATEGORIES, id).await? {
            return Ok(DeleteOutcome::NotFound);
        }

        debug!(id, name = %existing.name, "Deleted category document");
        Ok(DeleteOutcome::Deleted(existing))
    }

    async fn list_categories(&self, limit: u32, offset: u32) -> Result<Vec<Category>> {
        let categories = self.load_all().await?.into_iter().skip(offset as usize);
        let page = if limit == 0 {
            categories.collect()
        } else {
            categories.take(limit as usize).collect()
        };
        Ok(page)
    }

    async fn count_categories(&self) -> Result<i64> {
        let categories: Vec<Category> = self.connection.read_collection(CATEGORIES).await?;
        Ok(categories.len() as i64)
    }

    async fn truncate_categories(&self) -> Result<()> {
        let _guard = self.connection.lock_writes().await;
        self.connection.clear_collection(CATEGORIES).await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryReferenceCounter for CategoryRepository {
    async fn count_records_referencing_category(&self, category_id: &str) -> Result<i64> {
        let records: Vec<CashFlowReference> = self.connection.read_collection(CASH_FLOWS).await?;
        let count = records
            .iter()
            .filter(|record| record.category_id == category_id)
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CategoryType;
    use tempfile::TempDir;

    fn setup_repository() -> (CategoryRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = DocumentConnection::new(temp_dir.path()).unwrap();
        (CategoryRepository::new(connection), temp_dir)
    }

    fn write_raw(repo: &CategoryRepository, collection: &str, file: &str, content: &str) {
        let dir = repo.connection.collection_directory(collection);
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_damaged_cash_flow_fails_reference_count() {
        let (repo, _temp_dir) = setup_repository();
        let id = repo
            .insert_category(&NewCategory::root("Groceries", CategoryType::Expense))
            .await
            .unwrap();

        write_raw(
            &repo,
            CASH_FLOWS,
            "cf1.yaml",
            &format!("category_id: {}\namount: [12.5", id),
        );

        assert!(repo.count_records_referencing_category(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_damaged_child_blocks_parent_delete() {
        let (repo, _temp_dir) = setup_repository();
        let parent = repo
            .insert_category(&NewCategory::root("Food", CategoryType::Expense))
            .await
            .unwrap();

        write_raw(
            &repo,
            CATEGORIES,
            "damagedchild.yaml",
            &format!("id: damagedchild\nparent_id: {}\nname: [Groceries", parent),
        );

        assert!(repo.list_children(&parent).await.is_err());
        assert!(repo.delete_category(&parent).await.is_err());
        assert!(repo.get_category(&parent).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_damaged_document_fails_count() {
        let (repo, _temp_dir) = setup_repository();
        repo.insert_category(&NewCategory::root("Travel", CategoryType::Expense))
            .await
            .unwrap();
        write_raw(&repo, CATEGORIES, "broken.yaml", "name: [unterminated");

        assert!(repo.count_categories().await.is_err());
    }
}
