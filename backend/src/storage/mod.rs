//! # Storage Module
//!
//! Durable storage for categories and the cache-aware layer in front of it.
//!
//! - **traits.rs** - the `CategoryStorage` and `CategoryReferenceCounter` contracts
//! - **document/** - YAML document store
//! - **sqlite/** - SQLite store
//! - **backend.rs** - the closed set of backends, chosen once at startup
//! - **cached_store.rs** - read-through, invalidating, deadline-bounded decorator

pub mod backend;
pub mod cached_store;
pub mod document;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use backend::StorageBackend;
pub use cached_store::{CachedCategoryStore, StorageTimeout};
pub use traits::{CategoryReferenceCounter, CategoryStorage};
