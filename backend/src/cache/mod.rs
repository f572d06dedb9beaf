//! # Cache Module
//!
//! In-process caches sitting in front of the storage layer.

pub mod category_cache;

pub use category_cache::{CacheStats, CategoryCache};
