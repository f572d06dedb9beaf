use serde::{Deserialize, Serialize};

/// Category as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    /// Parent category ID, `None` for root categories
    pub parent_id: Option<String>,
    pub name: String,
    /// "income" or "expense"
    #[serde(rename = "type")]
    pub category_type: String,
    pub remark: String,
    /// RFC 3339 timestamp
    pub create_time: String,
    /// RFC 3339 timestamp
    pub modify_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: String,
    #[serde(default)]
    pub remark: String,
}

/// Partial update. Omitted fields are left unchanged; an empty `parent_id`
/// moves the category to the root level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub parent_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub total_count: i64,
    pub limit: u32,
    pub offset: u32,
}

/// A category together with its attached subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTreeNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: String,
    pub children: Vec<CategoryTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTreeResponse {
    pub data: Vec<CategoryTreeNode>,
    pub deep: u32,
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage in [0, 100]
    pub hit_rate: f64,
    /// RFC 3339 timestamp of the last full clear
    pub last_clear: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
