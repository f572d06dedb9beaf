use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Whether a category classifies money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("category type must be 'income' or 'expense', got '{0}'")]
pub struct UnknownCategoryType(pub String);

impl FromStr for CategoryType {
    type Err = UnknownCategoryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(UnknownCategoryType(s.to_string())),
        }
    }
}

/// A stored category. IDs and timestamps are assigned by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    #[serde(default)]
    pub remark: String,
    pub create_time: DateTime<Utc>,
    pub modify_time: DateTime<Utc>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Ordering used wherever categories are listed: name, then ID.
    /// Byte-wise, which matches SQLite's default BINARY collation.
    pub fn listing_order(a: &Category, b: &Category) -> Ordering {
        a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
    }

    /// Generate a fresh storage identifier
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Build a stored record from an insert payload
    pub fn from_new(id: String, fields: &NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id,
            parent_id: fields.parent_id.clone(),
            name: fields.name.clone(),
            category_type: fields.category_type,
            remark: fields.remark.clone(),
            create_time: now,
            modify_time: now,
        }
    }

    /// Apply an update payload, keeping `id` and `create_time`
    pub fn with_fields(&self, fields: &NewCategory, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            parent_id: fields.parent_id.clone(),
            name: fields.name.clone(),
            category_type: fields.category_type,
            remark: fields.remark.clone(),
            create_time: self.create_time,
            modify_time: now,
        }
    }
}

/// Mutable fields of a category, used for both insert and update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub parent_id: Option<String>,
    pub name: String,
    pub category_type: CategoryType,
    pub remark: String,
}

impl NewCategory {
    pub fn root(name: &str, category_type: CategoryType) -> Self {
        Self {
            parent_id: None,
            name: name.to_string(),
            category_type,
            remark: String::new(),
        }
    }

    pub fn child_of(parent_id: &str, name: &str, category_type: CategoryType) -> Self {
        Self {
            parent_id: Some(parent_id.to_string()),
            ..Self::root(name, category_type)
        }
    }
}

impl From<&Category> for NewCategory {
    fn from(category: &Category) -> Self {
        Self {
            parent_id: category.parent_id.clone(),
            name: category.name.clone(),
            category_type: category.category_type,
            remark: category.remark.clone(),
        }
    }
}

/// Result of a backend delete. Both backends refuse to remove a category
/// that still has children.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted(Category),
    NotFound,
    HasChildren,
}
