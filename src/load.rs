use std::fs;
use std::path::Path;

use crate::core::data::parse_value_text;
use crate::core::schema::SchemaNode;
use crate::core::schema_text::{TextFormat, parse_schema};
use crate::core::value::Value;
use crate::error::AppError;

pub fn read_text(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and interprets a schema file; `.json` files are read as JSON,
/// anything else as YAML.
pub fn load_schema(path: &Path) -> Result<SchemaNode, AppError> {
    let text = read_text(path)?;
    parse_schema(&text, TextFormat::from_path(path)).map_err(|source| AppError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_data(path: &Path) -> Result<Value, AppError> {
    let text = read_text(path)?;
    parse_value_text(&text, TextFormat::from_path(path)).map_err(|source| AppError::Data {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `text` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<(), AppError> {
    match path {
        Some(path) => fs::write(path, text).map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
