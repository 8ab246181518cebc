pub mod data;
pub mod merge;
pub mod schema;
pub mod schema_text;
pub mod validation;
pub mod validators;
pub mod value;
pub mod value_path;
