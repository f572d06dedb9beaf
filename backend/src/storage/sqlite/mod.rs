//! # SQLite Storage Module
//!
//! Relational backend built on SQLx.
//!
//! - **connection.rs** - connection pool and schema setup
//! - **category_repository.rs** - `CategoryStorage` over the `categories` table

pub mod category_repository;
pub mod connection;

pub use category_repository::CategoryRepository as SqliteCategoryRepository;
pub use connection::DbConnection;
