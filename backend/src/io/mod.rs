//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: category and cache administration routes
//! - **Data Serialization**: converting between the `shared` DTOs and domain types
//! - **Error Translation**: mapping domain error kinds to HTTP status codes

pub mod rest;

pub use rest::*;
