pub mod category_mapper;
pub mod error_mapper;

pub use category_mapper::CategoryMapper;
pub use error_mapper::error_response;
