//! Schema nodes and the default value generator.
//!
//! A schema is an immutable tree mirroring the shape of the value tree it
//! describes. Text leaves carry the rules used by [`crate::core::validation`].

use indexmap::IndexMap;

use crate::core::validators::Rule;
use crate::core::value::{Value, ValueKind};
use crate::core::value_path::{PathSegment, ValuePath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Text {
        label: String,
        rules: Vec<Rule>,
    },
    Object {
        label: String,
        fields: IndexMap<String, SchemaNode>,
    },
    Array {
        label: String,
        item: Box<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn text(label: impl Into<String>) -> Self {
        Self::Text {
            label: label.into(),
            rules: Vec::new(),
        }
    }

    pub fn object(label: impl Into<String>) -> Self {
        Self::Object {
            label: label.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn array(label: impl Into<String>, item: SchemaNode) -> Self {
        Self::Array {
            label: label.into(),
            item: Box::new(item),
        }
    }

    /// Adds a field to an object node. Ignored on other kinds.
    pub fn field(mut self, key: impl Into<String>, node: SchemaNode) -> Self {
        if let Self::Object { fields, .. } = &mut self {
            fields.insert(key.into(), node);
        }
        self
    }

    /// Adds a rule to a text node. Ignored on other kinds.
    pub fn rule(mut self, rule: Rule) -> Self {
        if let Self::Text { rules, .. } = &mut self {
            rules.push(rule);
        }
        self
    }

    pub fn required(self) -> Self {
        let rule = Rule::required(self.label());
        self.rule(rule)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Text { label, .. } | Self::Object { label, .. } | Self::Array { label, .. } => {
                label.as_str()
            }
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text { .. } => ValueKind::Text,
            Self::Object { .. } => ValueKind::Object,
            Self::Array { .. } => ValueKind::List,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        match self {
            Self::Text { rules, .. } => rules.as_slice(),
            _ => &[],
        }
    }

    pub fn is_required(&self) -> bool {
        self.rules().iter().any(Rule::is_required)
    }

    /// Schema node governing `path`. Index segments step into array items.
    pub fn at_path(&self, path: &ValuePath) -> Option<&SchemaNode> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Object { fields, .. }) => fields.get(key.as_str())?,
                (PathSegment::Index(_), Self::Array { item, .. }) => item.as_ref(),
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Empty value tree with the shape of `schema`: empty text for leaves, every
/// declared key for objects, no elements for arrays.
pub fn generate_default(schema: &SchemaNode) -> Value {
    match schema {
        SchemaNode::Text { .. } => Value::Text(String::new()),
        SchemaNode::Object { fields, .. } => Value::Object(
            fields
                .iter()
                .map(|(key, node)| (key.clone(), generate_default(node)))
                .collect(),
        ),
        SchemaNode::Array { .. } => Value::List(Vec::new()),
    }
}

/// Rule-less schema with the shape of `sample`. Arrays take the shape of their
/// first element; empty arrays hold text.
pub fn infer_schema(sample: &Value) -> SchemaNode {
    infer_node(sample, "")
}

fn infer_node(sample: &Value, label: &str) -> SchemaNode {
    match sample {
        Value::Text(_) => SchemaNode::text(label),
        Value::Object(map) => SchemaNode::Object {
            label: label.to_string(),
            fields: map
                .iter()
                .map(|(key, child)| (key.clone(), infer_node(child, humanize(key).as_str())))
                .collect(),
        },
        Value::List(items) => {
            let item = match items.first() {
                Some(first) => infer_node(first, label),
                None => SchemaNode::text(label),
            };
            SchemaNode::array(label, item)
        }
    }
}

/// `first_name` -> `First name`.
pub fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
