pub mod classify;
pub mod core;
pub mod error;
pub mod handler;
pub mod models;

pub use core::{Core, CoreState};
pub use error::ProxyError;
pub use models::ModelCatalog;
