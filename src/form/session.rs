use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::merge::{complete_with_schema, merge_with_schema};
use crate::core::schema::{SchemaNode, generate_default};
use crate::core::schema_text::{SchemaParseError, TextFormat, parse_schema};
use crate::core::validation::{ErrorMap, validate};
use crate::core::value::Value;
use crate::core::value_path::ValuePath;
use crate::form::tree::{FieldState, FormNode, RenderView, render_node};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("no value at '{0}'")]
    UnknownPath(String),
    #[error("'{path}' holds {found}, expected {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("'{0}' is not declared as an array")]
    NotAnArray(String),
    #[error("index {index} is out of range for '{path}' ({len} items)")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Rejected { errors: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Re-validate edited fields immediately. When off, edits stay `Edited`
    /// until the first submit attempt, after which every edit re-validates.
    pub validate_on_edit: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            validate_on_edit: true,
        }
    }
}

/// Owns one form: its schema, the value tree being edited, the current error
/// map and per-field state. All mutation goes through the methods here.
pub struct FormSession {
    schema: SchemaNode,
    value: Value,
    errors: ErrorMap,
    states: HashMap<ValuePath, FieldState>,
    options: SessionOptions,
    submit_attempted: bool,
}

impl FormSession {
    pub fn new(schema: SchemaNode) -> Self {
        let value = generate_default(&schema);
        Self::with_value(schema, value)
    }

    /// Starts from existing data. Declared fields missing from `value` are
    /// filled with their defaults so every error has an editable field; parts
    /// that do not conform to `schema` are kept and surface as structural errors.
    pub fn with_value(schema: SchemaNode, value: Value) -> Self {
        let value = complete_with_schema(&value, &schema);
        let errors = validate(&schema, &value);
        Self {
            schema,
            value,
            errors,
            states: HashMap::new(),
            options: SessionOptions::default(),
            submit_attempted: false,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn submit_attempted(&self) -> bool {
        self.submit_attempted
    }

    pub fn field_state(&self, path: &ValuePath) -> FieldState {
        self.states.get(path).copied().unwrap_or_default()
    }

    pub fn render(&self) -> FormNode {
        let view = RenderView {
            errors: &self.errors,
            states: &self.states,
            reveal_all: self.submit_attempted,
        };
        render_node(&ValuePath::empty(), &self.value, Some(&self.schema), &view)
    }

    pub fn text(&self, path: &ValuePath) -> Result<&str, FormError> {
        match self.value.get_path(path) {
            Some(Value::Text(text)) => Ok(text.as_str()),
            Some(other) => Err(wrong_kind(path, "text", other)),
            None => Err(FormError::UnknownPath(path.to_string())),
        }
    }

    /// Replaces the text leaf at `path`.
    pub fn edit(&mut self, path: &ValuePath, text: impl Into<String>) -> Result<(), FormError> {
        match self.value.get_path_mut(path) {
            Some(Value::Text(slot)) => *slot = text.into(),
            Some(other) => return Err(wrong_kind(path, "text", other)),
            None => return Err(FormError::UnknownPath(path.to_string())),
        }
        debug!(path = %path, "field edited");
        self.states.insert(path.clone(), FieldState::Edited);
        self.revalidate();
        Ok(())
    }

    /// Appends a default element to the list at `path`; returns its index.
    pub fn append(&mut self, path: &ValuePath) -> Result<usize, FormError> {
        let fresh = match self.schema.at_path(path) {
            Some(SchemaNode::Array { item, .. }) => generate_default(item),
            _ => return Err(FormError::NotAnArray(path.to_string())),
        };
        let list = self.list_mut(path)?;
        list.push(fresh);
        let index = list.len() - 1;
        debug!(path = %path, index, "list item appended");
        self.revalidate();
        Ok(index)
    }

    /// Removes the element at `index`, shifting later elements down. Field
    /// state below the list moves with its element.
    pub fn remove(&mut self, path: &ValuePath, index: usize) -> Result<Value, FormError> {
        let list = self.list_mut(path)?;
        if index >= list.len() {
            return Err(FormError::IndexOutOfRange {
                path: path.to_string(),
                index,
                len: list.len(),
            });
        }
        let removed = list.remove(index);
        self.shift_states(path, index);
        debug!(path = %path, index, "list item removed");
        self.revalidate();
        Ok(removed)
    }

    /// Validates the whole tree. With no errors `on_submit` receives the tree;
    /// otherwise every error becomes visible and `on_submit` is not called.
    pub fn submit(&mut self, on_submit: impl FnOnce(&Value)) -> SubmitOutcome {
        self.submit_attempted = true;
        self.errors = validate(&self.schema, &self.value);

        let mut leaves = Vec::new();
        self.value
            .visit_leaves(&mut |path, _| leaves.push(path.clone()));
        for path in leaves {
            let state = if self.errors.get_path(&path).is_some() {
                FieldState::Invalid
            } else {
                FieldState::Valid
            };
            self.states.insert(path, state);
        }

        if self.errors.is_empty() {
            info!("form submitted");
            on_submit(&self.value);
            SubmitOutcome::Submitted
        } else {
            info!(errors = self.errors.len(), "form submit rejected");
            SubmitOutcome::Rejected {
                errors: self.errors.len(),
            }
        }
    }

    /// Swaps in a new schema: the value tree is regenerated from it and merged
    /// with what was already entered.
    pub fn replace_schema(&mut self, schema: SchemaNode) {
        self.value = merge_with_schema(&self.value, &schema);
        self.schema = schema;
        let value = &self.value;
        self.states
            .retain(|path, _| matches!(value.get_path(path), Some(Value::Text(_))));
        self.errors = validate(&self.schema, &self.value);
        info!(fields = self.states.len(), "schema replaced");
    }

    /// Parses `text` and replaces the schema. On failure nothing changes.
    pub fn replace_schema_text(
        &mut self,
        text: &str,
        format: TextFormat,
    ) -> Result<(), SchemaParseError> {
        match parse_schema(text, format) {
            Ok(schema) => {
                self.replace_schema(schema);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "schema text rejected, keeping previous schema");
                Err(err)
            }
        }
    }

    fn list_mut(&mut self, path: &ValuePath) -> Result<&mut Vec<Value>, FormError> {
        match self.value.get_path_mut(path) {
            Some(Value::List(list)) => Ok(list),
            Some(other) => Err(wrong_kind(path, "array", other)),
            None => Err(FormError::UnknownPath(path.to_string())),
        }
    }

    fn shift_states(&mut self, list: &ValuePath, removed: usize) {
        let position = list.len();
        let states = std::mem::take(&mut self.states);
        self.states = states
            .into_iter()
            .filter_map(|(path, state)| match path.index_below(list) {
                Some(index) if index == removed => None,
                Some(index) if index > removed => {
                    Some((path.with_index_at(position, index - 1), state))
                }
                _ => Some((path, state)),
            })
            .collect();
    }

    fn revalidate(&mut self) {
        self.errors = validate(&self.schema, &self.value);
        if !self.options.validate_on_edit && !self.submit_attempted {
            return;
        }
        for (path, state) in self.states.iter_mut() {
            if *state == FieldState::Edited {
                *state = if self.errors.get_path(path).is_some() {
                    FieldState::Invalid
                } else {
                    FieldState::Valid
                };
            }
        }
    }
}

fn wrong_kind(path: &ValuePath, expected: &'static str, found: &Value) -> FormError {
    FormError::WrongKind {
        path: path.to_string(),
        expected,
        found: found.kind().name(),
    }
}

#[cfg(test)]
mod tests {
    use super::{FormError, FormSession, SessionOptions, SubmitOutcome};
    use crate::core::schema::SchemaNode;
    use crate::core::value::Value;
    use crate::core::value_path::ValuePath;
    use crate::form::tree::FieldState;

    fn schema() -> SchemaNode {
        SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field(
                "hobbies",
                SchemaNode::array("Hobbies", SchemaNode::text("Hobbies").required()),
            )
    }

    fn path(raw: &str) -> ValuePath {
        ValuePath::parse(raw).expect("path")
    }

    #[test]
    fn edit_moves_field_through_states() {
        let mut session = FormSession::new(schema());
        let name = path("name");
        assert_eq!(session.field_state(&name), FieldState::Pristine);

        session.edit(&name, "John").expect("edit");
        assert_eq!(session.field_state(&name), FieldState::Valid);

        session.edit(&name, "  ").expect("edit");
        assert_eq!(session.field_state(&name), FieldState::Invalid);
        assert_eq!(session.errors().get("name"), Some("Name is required"));
    }

    #[test]
    fn deferred_validation_keeps_edited_until_submit() {
        let mut session = FormSession::new(schema()).with_options(SessionOptions {
            validate_on_edit: false,
        });
        let name = path("name");
        session.edit(&name, "").expect("edit");
        assert_eq!(session.field_state(&name), FieldState::Edited);

        session.submit(|_| {});
        assert_eq!(session.field_state(&name), FieldState::Invalid);

        session.edit(&name, "John").expect("edit");
        assert_eq!(session.field_state(&name), FieldState::Valid);
    }

    #[test]
    fn edit_rejects_non_text_paths() {
        let mut session = FormSession::new(schema());
        assert_eq!(
            session.edit(&path("hobbies"), "x"),
            Err(FormError::WrongKind {
                path: "hobbies".to_string(),
                expected: "text",
                found: "array",
            })
        );
        assert_eq!(
            session.edit(&path("age"), "x"),
            Err(FormError::UnknownPath("age".to_string()))
        );
    }

    #[test]
    fn remove_shifts_field_state_with_elements() {
        let mut session = FormSession::new(schema());
        let hobbies = path("hobbies");
        for text in ["a", "b", "c"] {
            let index = session.append(&hobbies).expect("append");
            session.edit(&hobbies.index(index), text).expect("edit");
        }
        session.edit(&path("hobbies.2"), "").expect("edit");
        assert_eq!(session.field_state(&path("hobbies.2")), FieldState::Invalid);

        session.remove(&hobbies, 0).expect("remove");
        assert_eq!(session.field_state(&path("hobbies.1")), FieldState::Invalid);
        assert_eq!(session.field_state(&path("hobbies.0")), FieldState::Valid);
        assert_eq!(session.field_state(&path("hobbies.2")), FieldState::Pristine);
        assert_eq!(session.errors().get("hobbies.1"), Some("Hobbies is required"));
    }

    #[test]
    fn append_requires_declared_array() {
        let mut session = FormSession::new(schema());
        assert_eq!(
            session.append(&path("name")),
            Err(FormError::NotAnArray("name".to_string()))
        );
        assert_eq!(
            session.remove(&path("hobbies"), 0),
            Err(FormError::IndexOutOfRange {
                path: "hobbies".to_string(),
                index: 0,
                len: 0,
            })
        );
    }

    #[test]
    fn rejected_submit_reveals_errors_and_skips_callback() {
        let mut session = FormSession::new(schema());
        let mut calls = 0;
        let outcome = session.submit(|_| calls += 1);
        assert_eq!(outcome, SubmitOutcome::Rejected { errors: 1 });
        assert_eq!(calls, 0);
        assert!(session.submit_attempted());
        assert_eq!(
            session.render().find(&path("name")).and_then(|n| n.error()),
            Some("Name is required")
        );
    }

    #[test]
    fn successful_submit_passes_the_tree() {
        let mut session = FormSession::new(schema());
        session.edit(&path("name"), "John").expect("edit");
        let mut submitted = None;
        let outcome = session.submit(|value| submitted = Some(value.clone()));
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert_eq!(submitted.as_ref(), Some(session.value()));
        assert_eq!(
            session.value().get_path(&path("name")),
            Some(&Value::text("John"))
        );
    }
}
