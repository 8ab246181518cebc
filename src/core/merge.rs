//! Reconciles previously entered values with a freshly generated tree after
//! the schema changes.
//!
//! The fresh tree decides the structure: its keys are kept, keys that only
//! exist in the previous tree are dropped. Previous text leaves survive
//! wherever the same path still holds text. When a path changes kind the
//! fresh value wins and the discarded value is logged.

use indexmap::IndexMap;
use tracing::warn;

use crate::core::schema::{SchemaNode, generate_default};
use crate::core::value::Value;
use crate::core::value_path::ValuePath;

pub fn merge(previous: &Value, fresh: &Value) -> Value {
    merge_at(previous, fresh, &ValuePath::empty())
}

fn merge_at(previous: &Value, fresh: &Value, path: &ValuePath) -> Value {
    match (previous, fresh) {
        (Value::Text(_), Value::Text(_)) => previous.clone(),
        (Value::Object(prev), Value::Object(next)) => {
            Value::Object(merge_objects(prev, next, path))
        }
        (Value::List(prev), Value::List(next)) => match next.first() {
            Some(template) => Value::List(
                prev.iter()
                    .enumerate()
                    .map(|(index, item)| merge_at(item, template, &path.index(index)))
                    .collect(),
            ),
            None => previous.clone(),
        },
        _ => {
            log_discarded(previous, fresh, path);
            fresh.clone()
        }
    }
}

/// Same policy as [`merge`] against `generate_default(schema)`, except that
/// list elements are reconciled with the default of the array's item schema,
/// so existing elements take the new element shape.
pub fn merge_with_schema(previous: &Value, schema: &SchemaNode) -> Value {
    merge_schema_at(previous, schema, &ValuePath::empty())
}

fn merge_schema_at(previous: &Value, schema: &SchemaNode, path: &ValuePath) -> Value {
    match (previous, schema) {
        (Value::Text(_), SchemaNode::Text { .. }) => previous.clone(),
        (Value::Object(prev), SchemaNode::Object { fields, .. }) => {
            let mut out = IndexMap::with_capacity(fields.len());
            for (key, node) in fields {
                let child_path = path.key(key);
                let child = match prev.get(key.as_str()) {
                    Some(prev_child) => merge_schema_at(prev_child, node, &child_path),
                    None => generate_default(node),
                };
                out.insert(key.clone(), child);
            }
            log_dropped_keys(prev, |key| fields.contains_key(key), path);
            Value::Object(out)
        }
        (Value::List(prev), SchemaNode::Array { item, .. }) => Value::List(
            prev.iter()
                .enumerate()
                .map(|(index, element)| merge_schema_at(element, item, &path.index(index)))
                .collect(),
        ),
        _ => {
            let fresh = generate_default(schema);
            log_discarded(previous, &fresh, path);
            fresh
        }
    }
}

/// Adds the default of every declared field missing from `value` and puts
/// declared fields in schema order. Unlike [`merge_with_schema`] nothing is
/// dropped: undeclared keys follow the declared ones and mismatched nodes are
/// kept so they can report a structural error.
pub fn complete_with_schema(value: &Value, schema: &SchemaNode) -> Value {
    match (value, schema) {
        (Value::Object(map), SchemaNode::Object { fields, .. }) => {
            let mut out = IndexMap::with_capacity(fields.len().max(map.len()));
            for (key, node) in fields {
                let child = match map.get(key.as_str()) {
                    Some(child) => complete_with_schema(child, node),
                    None => generate_default(node),
                };
                out.insert(key.clone(), child);
            }
            for (key, child) in map {
                if !fields.contains_key(key.as_str()) {
                    out.insert(key.clone(), child.clone());
                }
            }
            Value::Object(out)
        }
        (Value::List(items), SchemaNode::Array { item, .. }) => Value::List(
            items
                .iter()
                .map(|element| complete_with_schema(element, item))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn merge_objects(
    prev: &IndexMap<String, Value>,
    next: &IndexMap<String, Value>,
    path: &ValuePath,
) -> IndexMap<String, Value> {
    let mut out = IndexMap::with_capacity(next.len());
    for (key, next_child) in next {
        let child_path = path.key(key);
        let child = match prev.get(key.as_str()) {
            Some(prev_child) => merge_at(prev_child, next_child, &child_path),
            None => next_child.clone(),
        };
        out.insert(key.clone(), child);
    }
    log_dropped_keys(prev, |key| next.contains_key(key), path);
    out
}

fn log_dropped_keys(
    prev: &IndexMap<String, Value>,
    still_declared: impl Fn(&str) -> bool,
    path: &ValuePath,
) {
    for (key, value) in prev {
        if !still_declared(key.as_str()) && !value.is_empty() {
            warn!(path = %path.key(key), "dropping value for field no longer in schema");
        }
    }
}

fn log_discarded(previous: &Value, fresh: &Value, path: &ValuePath) {
    if previous.is_empty() {
        return;
    }
    warn!(
        path = %path,
        from = previous.kind().name(),
        to = fresh.kind().name(),
        "field changed kind, previous value discarded"
    );
}

#[cfg(test)]
mod tests {
    use super::{complete_with_schema, merge, merge_with_schema};
    use crate::core::schema::{SchemaNode, generate_default};
    use crate::core::value::Value;
    use indexmap::IndexMap;

    fn object(entries: Vec<(&str, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn contacts_schema() -> SchemaNode {
        SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field(
                "contacts",
                SchemaNode::array(
                    "Contacts",
                    SchemaNode::object("Contacts")
                        .field("type", SchemaNode::text("Type"))
                        .field("value", SchemaNode::text("Value")),
                ),
            )
    }

    fn filled() -> Value {
        object(vec![
            ("name", Value::text("John")),
            (
                "contacts",
                Value::List(vec![object(vec![
                    ("type", Value::text("email")),
                    ("value", Value::text("john@example.com")),
                ])]),
            ),
        ])
    }

    #[test]
    fn merge_with_unchanged_schema_is_identity() {
        let schema = contacts_schema();
        let value = filled();
        assert_eq!(merge(&value, &generate_default(&schema)), value);
        assert_eq!(merge_with_schema(&value, &schema), value);
    }

    #[test]
    fn added_field_gets_default_and_previous_values_survive() {
        let previous = object(vec![("name", Value::text("John"))]);
        let schema = SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field("age", SchemaNode::text("Age").required());
        let expected = object(vec![("name", Value::text("John")), ("age", Value::text(""))]);
        assert_eq!(merge(&previous, &generate_default(&schema)), expected);
        assert_eq!(merge_with_schema(&previous, &schema), expected);
    }

    #[test]
    fn removed_field_is_dropped() {
        let previous = object(vec![("name", Value::text("John")), ("age", Value::text("40"))]);
        let fresh = object(vec![("name", Value::text(""))]);
        assert_eq!(merge(&previous, &fresh), object(vec![("name", Value::text("John"))]));
    }

    #[test]
    fn kind_change_prefers_fresh() {
        let previous = object(vec![("address", Value::text("Main street 1"))]);
        let fresh = object(vec![(
            "address",
            object(vec![("street", Value::text("")), ("city", Value::text(""))]),
        )]);
        assert_eq!(merge(&previous, &fresh), fresh);
    }

    #[test]
    fn schema_merge_reshapes_existing_list_elements() {
        let schema = SchemaNode::object("")
            .field("name", SchemaNode::text("Name"))
            .field(
                "contacts",
                SchemaNode::array(
                    "Contacts",
                    SchemaNode::object("Contacts")
                        .field("value", SchemaNode::text("Value"))
                        .field("primary", SchemaNode::text("Primary")),
                ),
            );
        let merged = merge_with_schema(&filled(), &schema);
        let expected = object(vec![
            ("name", Value::text("John")),
            (
                "contacts",
                Value::List(vec![object(vec![
                    ("value", Value::text("john@example.com")),
                    ("primary", Value::text("")),
                ])]),
            ),
        ]);
        assert_eq!(merged, expected);
    }

    #[test]
    fn list_merge_uses_first_fresh_element_as_template() {
        let previous = Value::List(vec![
            object(vec![("a", Value::text("1")), ("b", Value::text("2"))]),
            object(vec![("a", Value::text("3"))]),
        ]);
        let fresh = Value::List(vec![object(vec![("a", Value::text("")), ("c", Value::text(""))])]);
        let expected = Value::List(vec![
            object(vec![("a", Value::text("1")), ("c", Value::text(""))]),
            object(vec![("a", Value::text("3")), ("c", Value::text(""))]),
        ]);
        assert_eq!(merge(&previous, &fresh), expected);
    }

    #[test]
    fn completion_fills_declared_fields_and_keeps_the_rest() {
        let schema = contacts_schema();
        let value = object(vec![
            ("nickname", Value::text("Jo")),
            (
                "contacts",
                Value::List(vec![object(vec![("value", Value::text("j@example.com"))])]),
            ),
        ]);
        let expected = object(vec![
            ("name", Value::text("")),
            (
                "contacts",
                Value::List(vec![object(vec![
                    ("type", Value::text("")),
                    ("value", Value::text("j@example.com")),
                ])]),
            ),
            ("nickname", Value::text("Jo")),
        ]);
        assert_eq!(complete_with_schema(&value, &schema), expected);
    }

    #[test]
    fn completion_keeps_mismatched_nodes() {
        let value = object(vec![("contacts", Value::text("none"))]);
        let completed = complete_with_schema(&value, &contacts_schema());
        assert_eq!(
            completed,
            object(vec![("name", Value::text("")), ("contacts", Value::text("none"))])
        );
    }
}
