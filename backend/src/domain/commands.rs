//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs of the `shared`
//! crate onto them.

pub mod category {
    use crate::domain::models::Category;

    /// Input for creating a new category.
    #[derive(Debug, Clone)]
    pub struct CreateCategoryCommand {
        pub parent_id: Option<String>,
        pub name: String,
        /// "income" or "expense", case-insensitive
        pub category_type: String,
        pub remark: String,
    }

    /// Partial update. `None` leaves a field unchanged; `parent_id: Some("")`
    /// moves the category to the root level.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateCategoryCommand {
        pub parent_id: Option<String>,
        pub name: Option<String>,
        pub category_type: Option<String>,
        pub remark: Option<String>,
    }

    /// One page of the flat listing.
    #[derive(Debug, Clone)]
    pub struct CategoryPage {
        pub categories: Vec<Category>,
        pub total_count: i64,
    }
}
