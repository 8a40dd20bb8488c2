pub mod error;
pub mod generate_content;
pub mod schema;

pub use error::TransformError;
