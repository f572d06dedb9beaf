//! # Document Storage Module
//!
//! File-based document store. Each collection is a directory and each record
//! a YAML file, so the data stays human-readable and diffable.
//!
//! - **connection.rs** - directory layout, atomic document writes, write lock
//! - **category_repository.rs** - `CategoryStorage` over the `categories` collection

pub mod category_repository;
pub mod connection;

pub use category_repository::CategoryRepository as DocumentCategoryRepository;
pub use connection::DocumentConnection;
