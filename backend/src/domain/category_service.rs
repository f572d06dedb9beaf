//! # Category Service
//!
//! Business rules for categories: input validation, parent checks, the
//! delete guards and the tree view. All storage access goes through the
//! cached store, so lookups are cache-backed and mutations invalidate.

use anyhow::anyhow;
use std::collections::HashSet;
use tracing::{error, info, warn};

use super::category_tree::{CategoryTreeBuilder, CategoryTreeNode};
use super::commands::category::{CategoryPage, CreateCategoryCommand, UpdateCategoryCommand};
use super::errors::{CategoryError, CategoryResult, ValidationError};
use super::models::{Category, DeleteOutcome, NewCategory};
use super::validation::{normalize_parent_id, parse_category_type, validate_id, validate_name};
use crate::cache::CacheStats;
use crate::storage::{CachedCategoryStore, CategoryReferenceCounter, CategoryStorage};

fn storage_failure(operation: &str, err: anyhow::Error) -> CategoryError {
    error!(operation, error = %err, "Category storage call failed");
    CategoryError::Storage(err)
}

/// Service for managing expense and income categories
#[derive(Clone)]
pub struct CategoryService {
    store: CachedCategoryStore,
}

impl CategoryService {
    pub fn new(store: CachedCategoryStore) -> Self {
        Self { store }
    }

    /// Create a category and return it as stored
    pub async fn create_category(&self, command: CreateCategoryCommand) -> CategoryResult<Category> {
        info!(name = %command.name, "Creating category");

        let name = validate_name(&command.name)?;
        let category_type = parse_category_type(&command.category_type)?;
        let parent_id = normalize_parent_id(command.parent_id.as_deref());
        if let Some(parent_id) = &parent_id {
            self.require_parent(parent_id).await?;
        }

        let fields = NewCategory {
            parent_id,
            name,
            category_type,
            remark: command.remark.trim().to_string(),
        };
        let id = self
            .store
            .insert_category(&fields)
            .await
            .map_err(|e| storage_failure("insert_category", e))?;

        let created = self
            .store
            .get_category(&id)
            .await
            .map_err(|e| storage_failure("get_category", e))?
            .ok_or_else(|| storage_failure("get_category", anyhow!("category {} vanished after insert", id)))?;

        info!(id = %created.id, name = %created.name, "Created category");
        Ok(created)
    }

    pub async fn get_category(&self, id: &str) -> CategoryResult<Option<Category>> {
        validate_id(id)?;

        let category = self
            .store
            .get_category(id)
            .await
            .map_err(|e| storage_failure("get_category", e))?;
        if category.is_none() {
            warn!(id, "Category not found");
        }
        Ok(category)
    }

    /// Lookup used by the cash flow subsystem. A blank name finds nothing.
    pub async fn get_category_by_name(&self, name: &str) -> CategoryResult<Option<Category>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let category = self
            .store
            .get_category_by_name(name)
            .await
            .map_err(|e| storage_failure("get_category_by_name", e))?;
        if category.is_none() {
            warn!(name, "Category not found");
        }
        Ok(category)
    }

    pub async fn list_children(&self, parent_id: &str) -> CategoryResult<Vec<Category>> {
        validate_id(parent_id)?;

        self.store
            .list_children(parent_id)
            .await
            .map_err(|e| storage_failure("list_children", e))
    }

    /// One page of categories ordered by name, with the overall count.
    /// A `limit` of zero returns everything from `offset` on.
    pub async fn list_categories(&self, limit: u32, offset: u32) -> CategoryResult<CategoryPage> {
        let categories = self
            .store
            .list_categories(limit, offset)
            .await
            .map_err(|e| storage_failure("list_categories", e))?;
        let total_count = self
            .store
            .count_categories()
            .await
            .map_err(|e| storage_failure("count_categories", e))?;

        info!(returned = categories.len(), total_count, "Listed categories");
        Ok(CategoryPage {
            categories,
            total_count,
        })
    }

    pub async fn update_category(
        &self,
        id: &str,
        command: UpdateCategoryCommand,
    ) -> CategoryResult<Category> {
        info!(id, "Updating category");
        validate_id(id)?;

        let existing = self
            .get_category(id)
            .await?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        let mut fields = NewCategory::from(&existing);
        if let Some(name) = &command.name {
            fields.name = validate_name(name)?;
        }
        if let Some(category_type) = &command.category_type {
            fields.category_type = parse_category_type(category_type)?;
        }
        if let Some(remark) = &command.remark {
            fields.remark = remark.trim().to_string();
        }
        if let Some(parent_id) = &command.parent_id {
            fields.parent_id = normalize_parent_id(Some(parent_id.as_str()));
            if let Some(parent_id) = &fields.parent_id {
                self.check_reparent(id, parent_id).await?;
            }
        }

        let updated = self
            .store
            .update_category(id, &fields)
            .await
            .map_err(|e| storage_failure("update_category", e))?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;

        info!(id, name = %updated.name, "Updated category");
        Ok(updated)
    }

    pub async fn delete_category(&self, id: &str) -> CategoryResult<Category> {
        info!(id, "Deleting category");
        validate_id(id)?;

        let existing = self
            .get_category(id)
            .await?
            .ok_or_else(|| CategoryError::NotFound(id.to_string()))?;
        self.delete_existing(existing).await
    }

    pub async fn delete_category_by_name(&self, name: &str) -> CategoryResult<Category> {
        info!(name, "Deleting category by name");

        let existing = self
            .get_category_by_name(name)
            .await?
            .ok_or_else(|| CategoryError::NotFound(name.to_string()))?;
        self.delete_existing(existing).await
    }

    /// Build the category forest from an unbounded listing
    pub async fn category_tree(
        &self,
        max_depth: u32,
        category_type: Option<&str>,
    ) -> CategoryResult<Vec<CategoryTreeNode>> {
        let category_type = match category_type.map(str::trim).filter(|t| !t.is_empty()) {
            Some(value) => Some(parse_category_type(value)?),
            None => None,
        };

        let categories = self
            .store
            .list_categories(0, 0)
            .await
            .map_err(|e| storage_failure("list_categories", e))?;

        let forest = CategoryTreeBuilder::new(max_depth, category_type).build(&categories);
        info!(max_depth, roots = forest.len(), "Built category tree");
        Ok(forest)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.cache().stats()
    }

    pub fn enable_cache(&self) {
        self.store.cache().enable();
    }

    pub fn disable_cache(&self) {
        self.store.cache().disable();
    }

    pub fn clear_cache(&self) {
        self.store.cache().clear();
    }

    async fn require_parent(&self, parent_id: &str) -> CategoryResult<Category> {
        validate_id(parent_id).map_err(|_| ValidationError::MissingParent(parent_id.to_string()))?;

        self.store
            .get_category(parent_id)
            .await
            .map_err(|e| storage_failure("get_category", e))?
            .ok_or_else(|| ValidationError::MissingParent(parent_id.to_string()).into())
    }

    /// Reject moving `id` under itself or under one of its descendants
    async fn check_reparent(&self, id: &str, parent_id: &str) -> CategoryResult<()> {
        if parent_id == id {
            return Err(ValidationError::SelfParent(id.to_string()).into());
        }

        let mut ancestor = Some(self.require_parent(parent_id).await?);
        let mut seen = HashSet::new();
        while let Some(current) = ancestor {
            if current.id == id {
                return Err(ValidationError::CyclicParent {
                    id: id.to_string(),
                    parent_id: parent_id.to_string(),
                }
                .into());
            }
            // Stored data may already be cyclic; stop rather than loop
            if !seen.insert(current.id.clone()) {
                break;
            }
            ancestor = match current.parent_id.as_deref() {
                Some(next) => self
                    .store
                    .get_category(next)
                    .await
                    .map_err(|e| storage_failure("get_category", e))?,
                None => None,
            };
        }
        Ok(())
    }

    async fn delete_existing(&self, category: Category) -> CategoryResult<Category> {
        let references = self
            .store
            .count_records_referencing_category(&category.id)
            .await
            .map_err(|e| storage_failure("count_records_referencing_category", e))?;
        if references > 0 {
            warn!(id = %category.id, count = references, "Category is still referenced");
            return Err(CategoryError::HasReferences {
                id: category.id,
                count: references,
            });
        }

        let outcome = self
            .store
            .delete_category(&category.id)
            .await
            .map_err(|e| storage_failure("delete_category", e))?;
        match outcome {
            DeleteOutcome::Deleted(deleted) => {
                info!(id = %deleted.id, name = %deleted.name, "Deleted category");
                Ok(deleted)
            }
            DeleteOutcome::NotFound => Err(CategoryError::NotFound(category.id)),
            DeleteOutcome::HasChildren => {
                warn!(id = %category.id, "Category still has children");
                Err(CategoryError::HasChildren(category.id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CategoryCache;
    use crate::config::StorageKind;
    use crate::domain::models::CategoryType;
    use crate::storage::test_utils::{seed_cash_flow, TestBackend};
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup(kind: StorageKind) -> (CategoryService, TestBackend) {
        let test = TestBackend::new(kind).await;
        let store = CachedCategoryStore::new(
            test.backend.clone(),
            Arc::new(CategoryCache::new(true)),
            Duration::from_secs(5),
        );
        (CategoryService::new(store), test)
    }

    fn create(name: &str, category_type: &str, parent_id: Option<&str>) -> CreateCategoryCommand {
        CreateCategoryCommand {
            parent_id: parent_id.map(str::to_string),
            name: name.to_string(),
            category_type: category_type.to_string(),
            remark: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup_by_name() {
        for kind in [StorageKind::Document, StorageKind::Sqlite] {
            let (service, _test) = setup(kind).await;
            service.create_category(create("Food", "expense", None)).await.unwrap();

            let found = service.get_category_by_name("Food").await.unwrap().unwrap();
            assert_eq!(found.name, "Food");
            assert_eq!(found.category_type, CategoryType::Expense);

            // The re-read after insert already populated the cache
            service.get_category_by_name("Food").await.unwrap();
            assert_eq!(service.cache_stats().hits, 2);
        }
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (service, _test) = setup(StorageKind::Document).await;

        let err = service.create_category(create("  ", "expense", None)).await.unwrap_err();
        assert!(matches!(err, CategoryError::Validation(ValidationError::EmptyName)));

        let err = service.create_category(create("Food", "transfer", None)).await.unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Validation(ValidationError::InvalidCategoryType(_))
        ));

        let err = service
            .create_category(create("Groceries", "expense", Some("0123456789abcdef0123456789abcdef")))
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Validation(ValidationError::MissingParent(_))));

        // Blank parent means root
        let created = service.create_category(create("Food", "Expense", Some(""))).await.unwrap();
        assert!(created.is_root());
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_ids() {
        let (service, _test) = setup(StorageKind::Document).await;
        let err = service.get_category("../../etc").await.unwrap_err();
        assert!(matches!(err, CategoryError::Validation(ValidationError::InvalidId(_))));
        assert!(service
            .get_category("0123456789abcdef0123456789abcdef")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_with_children_leaves_state_unchanged() {
        for kind in [StorageKind::Document, StorageKind::Sqlite] {
            let (service, _test) = setup(kind).await;
            let food = service.create_category(create("Food", "expense", None)).await.unwrap();
            service
                .create_category(create("Groceries", "expense", Some(&food.id)))
                .await
                .unwrap();

            service.get_category_by_name("Food").await.unwrap();
            let before = service.cache_stats();

            let err = service.delete_category(&food.id).await.unwrap_err();
            assert!(matches!(err, CategoryError::HasChildren(ref id) if *id == food.id));

            let after = service.cache_stats();
            assert_eq!(after.size, before.size);
            assert_eq!(after.last_clear, before.last_clear);
            let cached = service.get_category_by_name("Food").await.unwrap().unwrap();
            assert_eq!(cached.id, food.id);
            assert_eq!(service.cache_stats().hits, after.hits + 1);
            assert_eq!(service.list_categories(0, 0).await.unwrap().total_count, 2);
        }
    }

    #[tokio::test]
    async fn test_delete_with_references_fails() {
        for kind in [StorageKind::Document, StorageKind::Sqlite] {
            let (service, test) = setup(kind).await;
            let food = service.create_category(create("Food", "expense", None)).await.unwrap();
            seed_cash_flow(&test, &food.id, 9.99).await;

            let err = service.delete_category(&food.id).await.unwrap_err();
            assert!(matches!(err, CategoryError::HasReferences { count: 1, .. }));
            assert!(service.get_category(&food.id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_delete_by_id_and_by_name() {
        let (service, _test) = setup(StorageKind::Sqlite).await;
        let food = service.create_category(create("Food", "expense", None)).await.unwrap();
        service.create_category(create("Salary", "income", None)).await.unwrap();

        let deleted = service.delete_category(&food.id).await.unwrap();
        assert_eq!(deleted.name, "Food");
        assert!(matches!(
            service.delete_category(&food.id).await,
            Err(CategoryError::NotFound(_))
        ));

        let deleted = service.delete_category_by_name("Salary").await.unwrap();
        assert_eq!(deleted.category_type, CategoryType::Income);
        assert!(matches!(
            service.delete_category_by_name("Salary").await,
            Err(CategoryError::NotFound(_))
        ));
        assert_eq!(service.list_categories(0, 0).await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn test_update_fields_and_move_to_root() {
        let (service, _test) = setup(StorageKind::Document).await;
        let food = service.create_category(create("Food", "expense", None)).await.unwrap();
        let groceries = service
            .create_category(create("Groceries", "expense", Some(&food.id)))
            .await
            .unwrap();

        let updated = service
            .update_category(
                &groceries.id,
                UpdateCategoryCommand {
                    name: Some("Supermarket".to_string()),
                    remark: Some("weekly shop".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Supermarket");
        assert_eq!(updated.parent_id.as_deref(), Some(food.id.as_str()));
        assert_eq!(updated.create_time, groceries.create_time);

        let moved = service
            .update_category(
                &groceries.id,
                UpdateCategoryCommand {
                    parent_id: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(moved.is_root());
        assert_eq!(moved.name, "Supermarket");

        let err = service
            .update_category("0123456789abcdef0123456789abcdef", UpdateCategoryCommand::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_cycles() {
        let (service, _test) = setup(StorageKind::Sqlite).await;
        let a = service.create_category(create("A", "expense", None)).await.unwrap();
        let b = service.create_category(create("B", "expense", Some(&a.id))).await.unwrap();
        let c = service.create_category(create("C", "expense", Some(&b.id))).await.unwrap();

        let err = service
            .update_category(
                &a.id,
                UpdateCategoryCommand {
                    parent_id: Some(a.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CategoryError::Validation(ValidationError::SelfParent(_))));

        let err = service
            .update_category(
                &a.id,
                UpdateCategoryCommand {
                    parent_id: Some(c.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Validation(ValidationError::CyclicParent { .. })
        ));

        // Moving a leaf elsewhere in the tree is fine
        let moved = service
            .update_category(
                &c.id,
                UpdateCategoryCommand {
                    parent_id: Some(a.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_list_categories_pages() {
        let (service, _test) = setup(StorageKind::Document).await;
        for name in ["Delta", "Alpha", "Charlie", "Bravo"] {
            service.create_category(create(name, "expense", None)).await.unwrap();
        }

        let page = service.list_categories(2, 1).await.unwrap();
        assert_eq!(page.total_count, 4);
        let names: Vec<&str> = page.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bravo", "Charlie"]);
    }

    #[tokio::test]
    async fn test_category_tree() {
        let (service, _test) = setup(StorageKind::Sqlite).await;
        let food = service.create_category(create("Food", "expense", None)).await.unwrap();
        service
            .create_category(create("Groceries", "expense", Some(&food.id)))
            .await
            .unwrap();
        service.create_category(create("Salary", "income", None)).await.unwrap();

        let forest = service.category_tree(0, None).await.unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].category.name, "Food");
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].category.name, "Groceries");

        let income = service.category_tree(0, Some("income")).await.unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].category.name, "Salary");

        assert!(service.category_tree(0, Some("")).await.unwrap().len() == 2);
        assert!(matches!(
            service.category_tree(0, Some("loans")).await,
            Err(CategoryError::Validation(ValidationError::InvalidCategoryType(_)))
        ));
    }

    #[tokio::test]
    async fn test_cache_administration() {
        let (service, _test) = setup(StorageKind::Document).await;
        service.create_category(create("Food", "expense", None)).await.unwrap();
        service.get_category_by_name("Food").await.unwrap();
        assert_eq!(service.cache_stats().size, 1);

        service.clear_cache();
        assert_eq!(service.cache_stats().size, 0);

        service.disable_cache();
        service.get_category_by_name("Food").await.unwrap();
        let stats = service.cache_stats();
        assert!(!stats.enabled);
        assert_eq!(stats.size, 0);

        service.enable_cache();
        service.get_category_by_name("Food").await.unwrap();
        assert_eq!(service.cache_stats().size, 1);
    }
}
