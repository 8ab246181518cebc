use indexmap::IndexMap;

use crate::core::value_path::{PathSegment, ValuePath};

/// A form value tree. Leaves are always text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Object(IndexMap<String, Value>),
    List(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Object,
    List,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Object => "object",
            Self::List => "array",
        }
    }
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Object(_) => ValueKind::Object,
            Self::List(_) => ValueKind::List,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(v) => v.is_empty(),
            Self::Object(v) => v.is_empty(),
            Self::List(v) => v.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_path(&self, path: &ValuePath) -> Option<&Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Object(map)) => map.get(key.as_str())?,
                (PathSegment::Index(index), Self::List(list)) => list.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_path_mut(&mut self, path: &ValuePath) -> Option<&mut Value> {
        let mut current = self;
        for segment in path.segments() {
            current = match (segment, current) {
                (PathSegment::Key(key), Self::Object(map)) => map.get_mut(key.as_str())?,
                (PathSegment::Index(index), Self::List(list)) => list.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Visits every text leaf with its path, in tree order.
    pub fn visit_leaves(&self, f: &mut impl FnMut(&ValuePath, &str)) {
        visit_leaves_at(self, &ValuePath::empty(), f);
    }
}

fn visit_leaves_at(value: &Value, path: &ValuePath, f: &mut impl FnMut(&ValuePath, &str)) {
    match value {
        Value::Text(text) => f(path, text.as_str()),
        Value::Object(map) => {
            for (key, child) in map {
                visit_leaves_at(child, &path.key(key), f);
            }
        }
        Value::List(list) => {
            for (index, child) in list.iter().enumerate() {
                visit_leaves_at(child, &path.index(index), f);
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Self::Object(value)
    }
}
