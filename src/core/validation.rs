use indexmap::IndexMap;
use serde::Serialize;

use crate::core::schema::{SchemaNode, generate_default};
use crate::core::validators::run_rules;
use crate::core::value::Value;
use crate::core::value_path::ValuePath;

/// Path-keyed validation messages, in tree order. An absent path has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: IndexMap<String, String>,
}

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn get_path(&self, path: &ValuePath) -> Option<&str> {
        self.get(path.to_string().as_str())
    }

    pub fn insert(&mut self, path: &ValuePath, message: impl Into<String>) {
        self.entries.insert(path.to_string(), message.into());
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Walks `schema` and `value` in lockstep.
///
/// Text leaves report the first failing rule. A node whose kind differs from
/// the schema reports a structural error at its path and is not descended
/// into; siblings are still validated. Declared fields missing from an object
/// are validated as their default, undeclared keys are ignored.
pub fn validate(schema: &SchemaNode, value: &Value) -> ErrorMap {
    let mut errors = ErrorMap::new();
    validate_at(schema, value, &ValuePath::empty(), &mut errors);
    errors
}

fn validate_at(schema: &SchemaNode, value: &Value, path: &ValuePath, errors: &mut ErrorMap) {
    match (schema, value) {
        (SchemaNode::Text { rules, .. }, Value::Text(text)) => {
            if let Err(message) = run_rules(rules, text) {
                errors.insert(path, message);
            }
        }
        (SchemaNode::Object { fields, .. }, Value::Object(map)) => {
            for (key, node) in fields {
                let child_path = path.key(key);
                match map.get(key.as_str()) {
                    Some(child) => validate_at(node, child, &child_path, errors),
                    None => validate_at(node, &generate_default(node), &child_path, errors),
                }
            }
        }
        (SchemaNode::Array { item, .. }, Value::List(items)) => {
            for (index, child) in items.iter().enumerate() {
                validate_at(item, child, &path.index(index), errors);
            }
        }
        (schema, value) => {
            errors.insert(path, structural_message(schema, value));
        }
    }
}

fn structural_message(schema: &SchemaNode, value: &Value) -> String {
    format!(
        "expected {}, found {}",
        schema.kind().name(),
        value.kind().name()
    )
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::core::schema::{SchemaNode, generate_default};
    use crate::core::validators::Rule;
    use crate::core::value::Value;
    use indexmap::IndexMap;

    fn person_schema() -> SchemaNode {
        SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field(
                "hobbies",
                SchemaNode::array("Hobbies", SchemaNode::text("Hobbies").required()),
            )
    }

    fn person(name: &str, hobbies: &[&str]) -> Value {
        let mut root = IndexMap::new();
        root.insert("name".to_string(), Value::text(name));
        root.insert(
            "hobbies".to_string(),
            Value::List(hobbies.iter().map(|h| Value::text(*h)).collect()),
        );
        Value::Object(root)
    }

    #[test]
    fn missing_name_is_the_only_error() {
        let errors = validate(&person_schema(), &person("", &["Reading"]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn one_invalid_array_leaf_is_keyed_by_index() {
        let errors = validate(&person_schema(), &person("John", &["Reading", " "]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("hobbies.1"), Some("Hobbies is required"));
    }

    #[test]
    fn defaults_only_fail_required_rules() {
        let schema = SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field(
                "email",
                SchemaNode::text("Email").rule(Rule::email("Email")),
            )
            .field(
                "address",
                SchemaNode::object("Address")
                    .field("city", SchemaNode::text("City").required())
                    .field(
                        "zip",
                        SchemaNode::text("Zip").rule(Rule::min_length(4, "Zip")),
                    ),
            );
        let errors = validate(&schema, &generate_default(&schema));
        let paths = errors.paths().collect::<Vec<_>>();
        assert_eq!(paths, vec!["name", "address.city"]);
    }

    #[test]
    fn structural_mismatch_is_reported_without_aborting_siblings() {
        let mut root = IndexMap::new();
        root.insert("name".to_string(), Value::text(""));
        root.insert("hobbies".to_string(), Value::text("Reading"));
        let errors = validate(&person_schema(), &Value::Object(root));
        assert_eq!(errors.get("hobbies"), Some("expected array, found text"));
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn root_mismatch_uses_empty_path() {
        let errors = validate(&person_schema(), &Value::List(Vec::new()));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(""), Some("expected object, found array"));
    }

    #[test]
    fn missing_fields_validate_as_default_and_extra_keys_are_ignored() {
        let mut root = IndexMap::new();
        root.insert("nickname".to_string(), Value::text("J"));
        let errors = validate(&person_schema(), &Value::Object(root));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("Name is required"));
    }
}
