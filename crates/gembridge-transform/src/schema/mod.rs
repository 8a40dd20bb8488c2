//! JSON-Schema handling for strict function calling.
//!
//! [`strict::rewrite`] makes a schema compliant; [`validate::validate`]
//! checks compliance without changing anything.

pub mod strict;
pub mod validate;

pub use strict::{lowercase_types, parameters_or_default, rewrite};
pub use validate::{
    SchemaError, SchemaValidation, format_errors, validate, validate_at, validate_tools,
};
