//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{Category, DeleteOutcome, NewCategory};

/// Trait defining the interface for category storage operations
///
/// Every implementation must behave identically: same ordering, same
/// not-found signalling, same delete guard. Referential checks that neither
/// engine enforces natively live in the implementations themselves.
#[async_trait]
pub trait CategoryStorage: Send + Sync {
    /// Retrieve a category by ID
    async fn get_category(&self, id: &str) -> Result<Option<Category>>;

    /// Retrieve a category by name
    /// When several categories share a name, the one with the smallest ID is returned
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// List the direct children of a category, ordered by name then ID
    async fn list_children(&self, parent_id: &str) -> Result<Vec<Category>>;

    /// Store a new category and return its assigned ID
    /// The backend assigns the ID and both timestamps
    async fn insert_category(&self, category: &NewCategory) -> Result<String>;

    /// Update an existing category, keeping its ID and creation time
    /// Returns `None` if no category with this ID exists
    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Option<Category>>;

    /// Delete a category unless it still has children
    async fn delete_category(&self, id: &str) -> Result<DeleteOutcome>;

    /// List categories ordered by name then ID
    /// A `limit` of zero returns every category after `offset`
    async fn list_categories(&self, limit: u32, offset: u32) -> Result<Vec<Category>>;

    /// Count all stored categories
    async fn count_categories(&self) -> Result<i64>;

    /// Remove every category
    async fn truncate_categories(&self) -> Result<()>;
}

/// Count of cash flow records pointing at a category
///
/// The records themselves are owned by the cash flow subsystem; this core only
/// reads the count to decide whether a category may be deleted.
#[async_trait]
pub trait CategoryReferenceCounter: Send + Sync {
    async fn count_records_referencing_category(&self, category_id: &str) -> Result<i64>;
}
