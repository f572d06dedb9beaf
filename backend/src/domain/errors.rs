//! Error kinds surfaced by the category domain.

use thiserror::Error;

/// Input rejected before it reaches storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("category name must not be empty")]
    EmptyName,

    #[error("category name must be at most {max} bytes, got {len}")]
    NameTooLong { len: usize, max: usize },

    #[error("category name '{0}' may only contain letters, digits, spaces, '-', '_' and '&'")]
    InvalidNameCharacters(String),

    #[error("'{0}' is not a valid category id")]
    InvalidId(String),

    #[error("category type must be 'income' or 'expense', got '{0}'")]
    InvalidCategoryType(String),

    #[error("category {0} cannot be its own parent")]
    SelfParent(String),

    #[error("category {id} cannot be moved under its descendant {parent_id}")]
    CyclicParent { id: String, parent_id: String },

    #[error("parent category {0} does not exist")]
    MissingParent(String),
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("category not found: {0}")]
    NotFound(String),

    #[error("category {0} has child categories")]
    HasChildren(String),

    #[error("category {id} is referenced by {count} cash flow records")]
    HasReferences { id: String, count: i64 },

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type CategoryResult<T> = Result<T, CategoryError>;
