//! Declarative schema documents.
//!
//! Schema text is untrusted: it is parsed as JSON or YAML data and then
//! interpreted against a small grammar. Nothing in it is executed.
//!
//! ```yaml
//! type: object
//! fields:
//!   name: { type: string, required: true, message: Name is required }
//!   email:
//!     type: string
//!     rules:
//!       - email
//!       - { rule: max_length, value: 64 }
//!   hobbies:
//!     type: array
//!     items: { type: string, required: true }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value as Raw, json};
use thiserror::Error;

use crate::core::schema::{SchemaNode, humanize};
use crate::core::validators::{Check, Rule};
use crate::core::value_path::ValuePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    Json,
    #[default]
    Yaml,
}

impl TextFormat {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{}: {message}", display_location(.location))]
    Grammar { location: String, message: String },
}

impl SchemaParseError {
    fn grammar(location: &ValuePath, message: impl Into<String>) -> Self {
        Self::Grammar {
            location: location.to_string(),
            message: message.into(),
        }
    }
}

fn display_location(location: &str) -> &str {
    if location.is_empty() { "schema root" } else { location }
}

const NODE_KEYS: &[&str] = &["type", "label", "required", "message", "rules", "fields", "items"];
const RULE_KEYS: &[&str] = &["rule", "value", "message"];

/// Reads a document into raw data, keeping mapping order.
pub fn parse_document(text: &str, format: TextFormat) -> Result<Raw, SchemaParseError> {
    match format {
        TextFormat::Json => Ok(serde_json::from_str(text)?),
        TextFormat::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

pub fn parse_schema(text: &str, format: TextFormat) -> Result<SchemaNode, SchemaParseError> {
    let raw = parse_document(text, format)?;
    interpret_schema(&raw)
}

/// Interprets already-parsed data. The root must be an object node.
pub fn interpret_schema(raw: &Raw) -> Result<SchemaNode, SchemaParseError> {
    let root = ValuePath::empty();
    let node = interpret_node(raw, &root, "")?;
    if !matches!(node, SchemaNode::Object { .. }) {
        return Err(SchemaParseError::grammar(
            &root,
            "top-level schema must be an object",
        ));
    }
    Ok(node)
}

fn interpret_node(raw: &Raw, at: &ValuePath, label: &str) -> Result<SchemaNode, SchemaParseError> {
    let map = match raw {
        Raw::String(name) => {
            return match name.as_str() {
                "string" | "text" => Ok(SchemaNode::text(label)),
                "object" | "array" => Err(SchemaParseError::grammar(
                    at,
                    format!("'{name}' needs a mapping with its {}", nested_key(name)),
                )),
                other => Err(SchemaParseError::grammar(
                    at,
                    format!("unknown type '{other}'"),
                )),
            };
        }
        Raw::Object(map) => map,
        _ => {
            return Err(SchemaParseError::grammar(
                at,
                "expected a type name or a mapping",
            ));
        }
    };

    reject_unknown_keys(map, NODE_KEYS, at)?;
    let kind = match map.get("type") {
        Some(Raw::String(kind)) => kind.as_str(),
        Some(_) => return Err(SchemaParseError::grammar(&at.key("type"), "expected a string")),
        None => return Err(SchemaParseError::grammar(at, "missing 'type'")),
    };
    let label = match map.get("label") {
        Some(Raw::String(custom)) => custom.clone(),
        Some(_) => {
            return Err(SchemaParseError::grammar(&at.key("label"), "expected a string"));
        }
        None => label.to_string(),
    };

    match kind {
        "string" | "text" => {
            reject_present(map, &["fields", "items"], kind, at)?;
            interpret_text(map, at, label)
        }
        "object" => {
            reject_present(map, &["required", "message", "rules", "items"], kind, at)?;
            let Some(Raw::Object(raw_fields)) = map.get("fields") else {
                return Err(SchemaParseError::grammar(
                    &at.key("fields"),
                    "object needs a 'fields' mapping",
                ));
            };
            let fields_at = at.key("fields");
            let mut fields = IndexMap::with_capacity(raw_fields.len());
            for (key, child) in raw_fields {
                let child_label = humanize(key);
                let node = interpret_node(child, &fields_at.key(key), child_label.as_str())?;
                fields.insert(key.clone(), node);
            }
            Ok(SchemaNode::Object { label, fields })
        }
        "array" => {
            reject_present(map, &["required", "message", "rules", "fields"], kind, at)?;
            let Some(raw_item) = map.get("items") else {
                return Err(SchemaParseError::grammar(
                    &at.key("items"),
                    "array needs an 'items' schema",
                ));
            };
            let item = interpret_node(raw_item, &at.key("items"), label.as_str())?;
            Ok(SchemaNode::array(label, item))
        }
        other => Err(SchemaParseError::grammar(
            &at.key("type"),
            format!("unknown type '{other}'"),
        )),
    }
}

fn interpret_text(
    map: &Map<String, Raw>,
    at: &ValuePath,
    label: String,
) -> Result<SchemaNode, SchemaParseError> {
    let mut rules = Vec::new();

    let required = match map.get("required") {
        Some(Raw::Bool(flag)) => *flag,
        Some(_) => return Err(SchemaParseError::grammar(&at.key("required"), "expected a boolean")),
        None => false,
    };
    let message = optional_string(map, "message", at)?;
    if required {
        let rule = Rule::required(label.as_str());
        rules.push(match message {
            Some(message) => rule.with_message(message),
            None => rule,
        });
    } else if message.is_some() {
        return Err(SchemaParseError::grammar(
            &at.key("message"),
            "'message' applies to 'required: true'",
        ));
    }

    match map.get("rules") {
        Some(Raw::Array(raw_rules)) => {
            let rules_at = at.key("rules");
            for (index, raw_rule) in raw_rules.iter().enumerate() {
                rules.push(interpret_rule(raw_rule, &rules_at.index(index), label.as_str())?);
            }
        }
        Some(_) => return Err(SchemaParseError::grammar(&at.key("rules"), "expected a list")),
        None => {}
    }

    Ok(SchemaNode::Text { label, rules })
}

fn interpret_rule(raw: &Raw, at: &ValuePath, label: &str) -> Result<Rule, SchemaParseError> {
    let (name, map) = match raw {
        Raw::String(name) => (name.as_str(), None),
        Raw::Object(map) => {
            reject_unknown_keys(map, RULE_KEYS, at)?;
            match map.get("rule") {
                Some(Raw::String(name)) => (name.as_str(), Some(map)),
                Some(_) => {
                    return Err(SchemaParseError::grammar(&at.key("rule"), "expected a string"));
                }
                None => return Err(SchemaParseError::grammar(at, "missing 'rule'")),
            }
        }
        _ => {
            return Err(SchemaParseError::grammar(
                at,
                "expected a rule name or a mapping",
            ));
        }
    };
    let param = map.and_then(|map| map.get("value"));

    let check = match name {
        "required" => Check::Required,
        "email" => Check::Email,
        "alphanumeric" => Check::Alphanumeric,
        "numeric" => Check::Numeric,
        "min_length" => Check::MinLength(length_param(param, name, at)?),
        "max_length" => Check::MaxLength(length_param(param, name, at)?),
        "pattern" => {
            let Some(Raw::String(pattern)) = param else {
                return Err(SchemaParseError::grammar(
                    &at.key("value"),
                    "'pattern' needs a string value",
                ));
            };
            let regex = regex::Regex::new(pattern).map_err(|err| {
                SchemaParseError::grammar(&at.key("value"), format!("invalid pattern: {err}"))
            })?;
            Check::Pattern(regex)
        }
        other => {
            return Err(SchemaParseError::grammar(
                at,
                format!("unknown rule '{other}'"),
            ));
        }
    };

    let rule = Rule::new(check, label);
    match map {
        Some(map) => match optional_string(map, "message", at)? {
            Some(message) => Ok(rule.with_message(message)),
            None => Ok(rule),
        },
        None => Ok(rule),
    }
}

fn length_param(param: Option<&Raw>, name: &str, at: &ValuePath) -> Result<usize, SchemaParseError> {
    param
        .and_then(Raw::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| {
            SchemaParseError::grammar(
                &at.key("value"),
                format!("'{name}' needs a non-negative integer value"),
            )
        })
}

fn optional_string(
    map: &Map<String, Raw>,
    key: &str,
    at: &ValuePath,
) -> Result<Option<String>, SchemaParseError> {
    match map.get(key) {
        Some(Raw::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(SchemaParseError::grammar(&at.key(key), "expected a string")),
        None => Ok(None),
    }
}

fn reject_unknown_keys(
    map: &Map<String, Raw>,
    allowed: &[&str],
    at: &ValuePath,
) -> Result<(), SchemaParseError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(SchemaParseError::grammar(at, format!("unknown key '{key}'"))),
        None => Ok(()),
    }
}

fn reject_present(
    map: &Map<String, Raw>,
    keys: &[&str],
    kind: &str,
    at: &ValuePath,
) -> Result<(), SchemaParseError> {
    match keys.iter().find(|key| map.contains_key(**key)) {
        Some(key) => Err(SchemaParseError::grammar(
            &at.key(key),
            format!("'{key}' is not allowed on type '{kind}'"),
        )),
        None => Ok(()),
    }
}

fn nested_key(kind: &str) -> &'static str {
    if kind == "object" { "'fields'" } else { "'items'" }
}

/// Writes `schema` back in the document grammar. Labels and messages are only
/// written when they differ from the ones the interpreter would derive.
pub fn describe_schema(schema: &SchemaNode) -> Raw {
    describe_node(schema, "")
}

fn describe_node(schema: &SchemaNode, derived_label: &str) -> Raw {
    let mut out = Map::new();
    match schema {
        SchemaNode::Text { label, rules } => {
            out.insert("type".to_string(), json!("string"));
            describe_label(&mut out, label, derived_label);
            let described = rules
                .iter()
                .map(|rule| describe_rule(rule, label))
                .collect::<Vec<_>>();
            if !described.is_empty() {
                out.insert("rules".to_string(), Raw::Array(described));
            }
        }
        SchemaNode::Object { label, fields } => {
            out.insert("type".to_string(), json!("object"));
            describe_label(&mut out, label, derived_label);
            let fields = fields
                .iter()
                .map(|(key, node)| (key.clone(), describe_node(node, humanize(key).as_str())))
                .collect::<Map<_, _>>();
            out.insert("fields".to_string(), Raw::Object(fields));
        }
        SchemaNode::Array { label, item } => {
            out.insert("type".to_string(), json!("array"));
            describe_label(&mut out, label, derived_label);
            out.insert("items".to_string(), describe_node(item, label));
        }
    }
    Raw::Object(out)
}

fn describe_label(out: &mut Map<String, Raw>, label: &str, derived: &str) {
    if label != derived {
        out.insert("label".to_string(), json!(label));
    }
}

fn describe_rule(rule: &Rule, label: &str) -> Raw {
    let check = rule.check();
    let value = match check {
        Check::MinLength(n) | Check::MaxLength(n) => Some(json!(n)),
        Check::Pattern(re) => Some(json!(re.as_str())),
        _ => None,
    };
    let default_message = Rule::new(check.clone(), label);
    let message = (default_message.message() != rule.message()).then(|| rule.message());
    if value.is_none() && message.is_none() {
        return json!(check.name());
    }
    let mut out = Map::new();
    out.insert("rule".to_string(), json!(check.name()));
    if let Some(value) = value {
        out.insert("value".to_string(), value);
    }
    if let Some(message) = message {
        out.insert("message".to_string(), json!(message));
    }
    Raw::Object(out)
}

pub fn schema_to_yaml(schema: &SchemaNode) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&describe_schema(schema))
}

#[cfg(test)]
mod tests {
    use super::{SchemaParseError, TextFormat, describe_schema, interpret_schema, parse_schema};
    use crate::core::schema::SchemaNode;
    use crate::core::validators::Rule;
    use crate::core::value_path::ValuePath;
    use std::path::Path;

    const PROFILE: &str = r#"
type: object
fields:
  name: { type: string, required: true }
  email:
    type: string
    rules:
      - email
      - { rule: max_length, value: 64, message: Too long }
  address:
    type: object
    fields:
      street: string
      city: { type: text, label: Town }
  hobbies:
    type: array
    items: { type: string, required: true, message: Pick a hobby }
"#;

    #[test]
    fn parses_yaml_profile() {
        let schema = parse_schema(PROFILE, TextFormat::Yaml).expect("schema");
        let SchemaNode::Object { fields, .. } = &schema else {
            panic!("expected object");
        };
        assert_eq!(
            fields.keys().cloned().collect::<Vec<_>>(),
            vec!["name", "email", "address", "hobbies"]
        );
        assert_eq!(fields["name"], SchemaNode::text("Name").required());
        assert_eq!(
            fields["email"],
            SchemaNode::text("Email")
                .rule(Rule::email("Email"))
                .rule(Rule::max_length(64, "Email").with_message("Too long"))
        );

        let town = schema
            .at_path(&ValuePath::parse("address.city").expect("path"))
            .expect("city");
        assert_eq!(town.label(), "Town");

        let hobby = schema
            .at_path(&ValuePath::parse("hobbies.0").expect("path"))
            .expect("hobby");
        assert_eq!(hobby.rules()[0].validate(""), Err("Pick a hobby".to_string()));
    }

    #[test]
    fn parses_json_documents() {
        let text = r#"{"type":"object","fields":{"b":"string","a":{"type":"array","items":"text"}}}"#;
        let schema = parse_schema(text, TextFormat::Json).expect("schema");
        let SchemaNode::Object { fields, .. } = &schema else {
            panic!("expected object");
        };
        assert_eq!(fields.keys().cloned().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn reports_grammar_errors_with_location() {
        let cases = [
            (
                "type: object\nfields:\n  age: { type: number }\n",
                "fields.age.type: unknown type 'number'",
            ),
            (
                "type: object\nfields:\n  age: { type: string, rules: [shout] }\n",
                "fields.age.rules.0: unknown rule 'shout'",
            ),
            (
                "type: object\nfields:\n  age: { type: string, rules: [{ rule: min_length }] }\n",
                "fields.age.rules.0.value: 'min_length' needs a non-negative integer value",
            ),
            (
                "type: object\nfields:\n  age: { type: string, colour: red }\n",
                "fields.age: unknown key 'colour'",
            ),
            ("type: string\n", "schema root: top-level schema must be an object"),
            ("type: array\n", "items: array needs an 'items' schema"),
        ];
        for (text, expected) in cases {
            let err = parse_schema(text, TextFormat::Yaml).expect_err(text);
            assert_eq!(err.to_string(), expected, "for {text:?}");
        }
    }

    #[test]
    fn rejects_bad_patterns_without_panicking() {
        let text = "type: object\nfields:\n  code: { type: string, rules: [{ rule: pattern, value: '(' }] }\n";
        let err = parse_schema(text, TextFormat::Yaml).expect_err("bad regex");
        assert!(matches!(err, SchemaParseError::Grammar { .. }));
        assert!(err.to_string().starts_with("fields.code.rules.0.value: invalid pattern"));
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(matches!(
            parse_schema("{ not json", TextFormat::Json),
            Err(SchemaParseError::Json(_))
        ));
        assert!(matches!(
            parse_schema("type: [unclosed", TextFormat::Yaml),
            Err(SchemaParseError::Yaml(_))
        ));
    }

    #[test]
    fn description_reads_back_as_the_same_schema() {
        let schema = parse_schema(PROFILE, TextFormat::Yaml).expect("schema");
        let described = describe_schema(&schema);
        assert_eq!(interpret_schema(&described).expect("reparse"), schema);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(TextFormat::from_path(Path::new("form.JSON")), TextFormat::Json);
        assert_eq!(TextFormat::from_path(Path::new("form.yml")), TextFormat::Yaml);
        assert_eq!(TextFormat::from_path(Path::new("form")), TextFormat::Yaml);
    }
}
