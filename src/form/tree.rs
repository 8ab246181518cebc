use std::collections::HashMap;

use crate::core::schema::{SchemaNode, generate_default, humanize};
use crate::core::validation::ErrorMap;
use crate::core::value::Value;
use crate::core::value_path::ValuePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Pristine,
    Edited,
    Invalid,
    Valid,
}

/// Editable view of a value tree. Built fresh on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormNode {
    Field {
        path: ValuePath,
        label: String,
        value: String,
        required: bool,
        state: FieldState,
        error: Option<String>,
    },
    Group {
        path: ValuePath,
        label: String,
        children: Vec<FormNode>,
        error: Option<String>,
    },
    List {
        path: ValuePath,
        label: String,
        items: Vec<FormNode>,
        error: Option<String>,
    },
}

impl FormNode {
    pub fn path(&self) -> &ValuePath {
        match self {
            Self::Field { path, .. } | Self::Group { path, .. } | Self::List { path, .. } => path,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Field { label, .. } | Self::Group { label, .. } | Self::List { label, .. } => {
                label.as_str()
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Field { error, .. } | Self::Group { error, .. } | Self::List { error, .. } => {
                error.as_deref()
            }
        }
    }

    /// Depth-first search for the node at `path`.
    pub fn find(&self, path: &ValuePath) -> Option<&FormNode> {
        if self.path() == path {
            return Some(self);
        }
        match self {
            Self::Field { .. } => None,
            Self::Group { children, .. } => children.iter().find_map(|child| child.find(path)),
            Self::List { items, .. } => items.iter().find_map(|item| item.find(path)),
        }
    }
}

/// What the renderer needs from the session besides the trees themselves.
pub struct RenderView<'a> {
    pub errors: &'a ErrorMap,
    pub states: &'a HashMap<ValuePath, FieldState>,
    /// Show every field error, not only those of fields already marked invalid.
    pub reveal_all: bool,
}

impl RenderView<'_> {
    fn field_error(&self, path: &ValuePath) -> Option<String> {
        let state = self.states.get(path).copied().unwrap_or_default();
        if !self.reveal_all && state != FieldState::Invalid {
            return None;
        }
        self.errors.get_path(path).map(str::to_string)
    }

    fn structural_error(&self, path: &ValuePath) -> Option<String> {
        self.errors.get_path(path).map(str::to_string)
    }
}

/// Builds the UI subtree for `value`.
///
/// Dispatch is on the value's variant; `schema` supplies labels, the required
/// marker, the shape of list items and the order of object children. Declared
/// fields come first in schema order (a missing one renders as its default),
/// then undeclared keys. A value whose kind differs from its schema still
/// renders, carrying the structural error.
pub fn render_node(
    path: &ValuePath,
    value: &Value,
    schema: Option<&SchemaNode>,
    view: &RenderView<'_>,
) -> FormNode {
    let label = node_label(path, schema);
    let mismatched = schema.is_some_and(|schema| schema.kind() != value.kind());

    match value {
        Value::Text(text) => FormNode::Field {
            path: path.clone(),
            label,
            value: text.clone(),
            required: schema.is_some_and(SchemaNode::is_required),
            state: view.states.get(path).copied().unwrap_or_default(),
            error: if mismatched {
                view.structural_error(path)
            } else {
                view.field_error(path)
            },
        },
        Value::Object(map) => {
            let fields = match schema {
                Some(SchemaNode::Object { fields, .. }) => Some(fields),
                _ => None,
            };
            let mut children = Vec::with_capacity(map.len());
            for (key, node) in fields.into_iter().flatten() {
                let child_path = path.key(key);
                match map.get(key.as_str()) {
                    Some(child) => children.push(render_node(&child_path, child, Some(node), view)),
                    None => {
                        let fresh = generate_default(node);
                        children.push(render_node(&child_path, &fresh, Some(node), view));
                    }
                }
            }
            for (key, child) in map {
                if fields.is_some_and(|fields| fields.contains_key(key.as_str())) {
                    continue;
                }
                children.push(render_node(&path.key(key), child, None, view));
            }
            FormNode::Group {
                path: path.clone(),
                label,
                children,
                error: mismatched.then(|| view.structural_error(path)).flatten(),
            }
        }
        Value::List(list) => {
            let item_schema = match schema {
                Some(SchemaNode::Array { item, .. }) => Some(item.as_ref()),
                _ => None,
            };
            let items = list
                .iter()
                .enumerate()
                .map(|(index, item)| render_node(&path.index(index), item, item_schema, view))
                .collect();
            FormNode::List {
                path: path.clone(),
                label,
                items,
                error: mismatched.then(|| view.structural_error(path)).flatten(),
            }
        }
    }
}

fn node_label(path: &ValuePath, schema: Option<&SchemaNode>) -> String {
    match schema.map(SchemaNode::label) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => path.last_key().map(humanize).unwrap_or_default(),
    }
}
