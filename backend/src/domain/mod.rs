//! # Domain Module
//!
//! Business logic for cashbook categories, independent of any storage engine
//! or transport.
//!
//! ## Module Organization
//!
//! - **models**: the `Category` entity and storage payloads
//! - **category_service**: validation, referential guards and orchestration
//! - **category_tree**: pure forest construction from a flat listing
//! - **validation**: name, id and type rules
//! - **commands**: service inputs and outputs
//! - **errors**: validation and category error kinds
//!
//! ## Business Rules
//!
//! - No category may become its own ancestor
//! - A category with children cannot be deleted
//! - A category referenced by cash flow records cannot be deleted
//! - Names are practically unique but never relied on for correctness

pub mod category_service;
pub mod category_tree;
pub mod commands;
pub mod errors;
pub mod models;
pub mod validation;

pub use category_service::CategoryService;
pub use category_tree::{CategoryTreeBuilder, CategoryTreeNode};
pub use commands::category::{CategoryPage, CreateCategoryCommand, UpdateCategoryCommand};
pub use errors::{CategoryError, CategoryResult, ValidationError};
