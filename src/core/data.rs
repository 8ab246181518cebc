use indexmap::IndexMap;
use serde_json::Value as Raw;
use thiserror::Error;

use crate::core::schema_text::TextFormat;
use crate::core::value::Value;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML data: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Converts loaded data into a value tree. Scalars become text, `null`
/// becomes empty text.
pub fn value_from_json(raw: &Raw) -> Value {
    match raw {
        Raw::Null => Value::Text(String::new()),
        Raw::Bool(flag) => Value::Text(flag.to_string()),
        Raw::Number(number) => Value::Text(number.to_string()),
        Raw::String(text) => Value::Text(text.clone()),
        Raw::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        Raw::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), value_from_json(child)))
                .collect::<IndexMap<_, _>>(),
        ),
    }
}

pub fn value_to_json(value: &Value) -> Raw {
    match value {
        Value::Text(text) => Raw::String(text.clone()),
        Value::List(items) => Raw::Array(items.iter().map(value_to_json).collect()),
        Value::Object(map) => Raw::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), value_to_json(child)))
                .collect(),
        ),
    }
}

pub fn parse_value_text(text: &str, format: TextFormat) -> Result<Value, DataError> {
    let raw: Raw = match format {
        TextFormat::Json => serde_json::from_str(text)?,
        TextFormat::Yaml => serde_yaml::from_str(text)?,
    };
    Ok(value_from_json(&raw))
}
