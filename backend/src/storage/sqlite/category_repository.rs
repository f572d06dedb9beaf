use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

use super::connection::DbConnection;
use crate::domain::models::{Category, CategoryType, DeleteOutcome, NewCategory};
use crate::storage::traits::{CategoryReferenceCounter, CategoryStorage};

const SELECT_COLUMNS: &str =
    "SELECT id, parent_id, name, type, remark, create_time, modify_time FROM categories";

/// Repository for category operations on SQLite
#[derive(Clone)]
pub struct CategoryRepository {
    db: DbConnection,
}

impl CategoryRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn format_time(time: &DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn parse_time(value: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Invalid timestamp in categories table: {}", value))?
            .with_timezone(&Utc))
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        let category_type: String = row.try_get("type")?;
        let create_time: String = row.try_get("create_time")?;
        let modify_time: String = row.try_get("modify_time")?;

        Ok(Category {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            name: row.try_get("name")?,
            category_type: category_type.parse::<CategoryType>()?,
            remark: row.try_get("remark")?,
            create_time: Self::parse_time(&create_time)?,
            modify_time: Self::parse_time(&modify_time)?,
        })
    }

    fn rows_to_categories(rows: &[SqliteRow]) -> Result<Vec<Category>> {
        rows.iter().map(Self::row_to_category).collect()
    }
}

#[async_trait]
impl CategoryStorage for CategoryRepository {
    async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "{} WHERE name = ? ORDER BY id ASC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "{} WHERE parent_id = ? ORDER BY name ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(self.db.pool())
        .await?;

        Self::rows_to_categories(&rows)
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<String> {
        let stored = Category::from_new(Category::generate_id(), category, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO categories (id, parent_id, name, type, remark, create_time, modify_time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.parent_id)
        .bind(&stored.name)
        .bind(stored.category_type.as_str())
        .bind(&stored.remark)
        .bind(Self::format_time(&stored.create_time))
        .bind(Self::format_time(&stored.modify_time))
        .execute(self.db.pool())
        .await?;

        debug!(id = %stored.id, name = %stored.name, "Inserted category row");
        Ok(stored.id)
    }

    async fn update_category(&self, id: &str, category: &NewCategory) -> Result<Option<Category>> {
        let Some(existing) = self.get_category(id).await? else {
            info!(id, "Category does not exist, nothing to update");
            return Ok(None);
        };

        let updated = existing.with_fields(category, Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE categories
            SET parent_id = ?, name = ?, type = ?, remark = ?, modify_time = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.parent_id)
        .bind(&updated.name)
        .bind(updated.category_type.as_str())
        .bind(&updated.remark)
        .bind(Self::format_time(&updated.modify_time))
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            info!(id, "Category disappeared before it could be updated");
            return Ok(None);
        }

        debug!(id, name = %updated.name, "Updated category row");
        Ok(Some(updated))
    }

    async fn delete_category(&self, id: &str) -> Result<DeleteOutcome> {
        let Some(existing) = self.get_category(id).await? else {
            info!(id, "Category does not exist, nothing to delete");
            return Ok(DeleteOutcome::NotFound);
        };

        if !self.list_children(id).await?.is_empty() {
            info!(id, "Refusing to delete a category that has child categories");
            return Ok(DeleteOutcome::HasChildren);
        }

        // Re-check inside the statement so a child inserted after the check
        // above still blocks the delete
        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = ?
              AND NOT EXISTS (SELECT 1 FROM categories WHERE parent_id = ?)
            "#,
        )
        .bind(id)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(match self.get_category(id).await? {
                Some(_) => DeleteOutcome::HasChildren,
                None => DeleteOutcome::NotFound,
            });
        }

        debug!(id, name = %existing.name, "Deleted category row");
        Ok(DeleteOutcome::Deleted(existing))
    }

    async fn list_categories(&self, limit: u32, offset: u32) -> Result<Vec<Category>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = if limit == 0 { -1 } else { i64::from(limit) };

        let rows = sqlx::query(&format!(
            "{} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(i64::from(offset))
        .fetch_all(self.db.pool())
        .await?;

        Self::rows_to_categories(&rows)
    }

    async fn count_categories(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM categories")
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.try_get("count")?)
    }

    async fn truncate_categories(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories")
            .execute(self.db.pool())
            .await?;
        info!(removed = result.rows_affected(), "Truncated categories table");
        Ok(())
    }
}

#[async_trait]
impl CategoryReferenceCounter for CategoryRepository {
    async fn count_records_referencing_category(&self, category_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM cash_flows WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.try_get("count")?)
    }
}
