pub mod generate_content;
pub mod get_model;
pub mod list_models;
