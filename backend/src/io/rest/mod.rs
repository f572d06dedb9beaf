//! # REST API Interface Layer
//!
//! HTTP endpoints for the cashbook category service.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: RESTful interfaces for categories and cache administration
//! - **Error Handling**: validation 400, not found 404, referential conflicts 409,
//!   storage failures 500
//! - **Serialization**: JSON request/response handling via the `shared` DTOs
//!
//! This layer holds no business rules of its own.

pub mod cache_apis;
pub mod category_apis;
pub mod mappers;

pub use cache_apis::*;
pub use category_apis::*;
