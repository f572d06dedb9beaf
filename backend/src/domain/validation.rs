//! Input rules for category names, ids and types.

use super::errors::ValidationError;
use super::models::CategoryType;

pub const MAX_NAME_LEN: usize = 100;

/// Validate and trim a category name
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len: trimmed.len(),
            max: MAX_NAME_LEN,
        });
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '-' | '_' | '&');
    if !trimmed.chars().all(allowed) {
        return Err(ValidationError::InvalidNameCharacters(trimmed.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Ids are UUIDs; both hyphenated and simple forms are accepted
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidId(id.to_string()))
}

pub fn parse_category_type(value: &str) -> Result<CategoryType, ValidationError> {
    value
        .parse::<CategoryType>()
        .map_err(|_| ValidationError::InvalidCategoryType(value.to_string()))
}

/// Normalise an optional parent id: blank means root
pub fn normalize_parent_id(parent_id: Option<&str>) -> Option<String> {
    parent_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
