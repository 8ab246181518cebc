use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        self.segments.as_slice()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn starts_with(&self, prefix: &ValuePath) -> bool {
        self.segments.starts_with(prefix.segments())
    }

    /// Index segment directly below `prefix`, if this path passes through one.
    pub fn index_below(&self, prefix: &ValuePath) -> Option<usize> {
        if !self.starts_with(prefix) {
            return None;
        }
        match self.segments.get(prefix.len()) {
            Some(PathSegment::Index(index)) => Some(*index),
            _ => None,
        }
    }

    /// Copy of this path with the segment at `position` replaced by `index`.
    pub fn with_index_at(&self, position: usize, index: usize) -> Self {
        let mut segments = self.segments.clone();
        if let Some(slot) = segments.get_mut(position) {
            *slot = PathSegment::Index(index);
        }
        Self { segments }
    }

    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn parse(input: &str) -> Result<Self, ValuePathParseError> {
        parse_path(input)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if is_identifier(key) {
                        if idx > 0 {
                            f.write_str(".")?;
                        }
                        f.write_str(key)?;
                    } else {
                        f.write_str("[\"")?;
                        f.write_str(key.replace('\\', "\\\\").replace('"', "\\\"").as_str())?;
                        f.write_str("\"]")?;
                    }
                }
                PathSegment::Index(index) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{index}")?;
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for ValuePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self::new(segments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePathParseError {
    message: String,
}

impl ValuePathParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValuePathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl std::error::Error for ValuePathParseError {}

fn parse_path(input: &str) -> Result<ValuePath, ValuePathParseError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Ok(ValuePath::empty());
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut idx = 0usize;
    let mut out = Vec::<PathSegment>::new();

    while idx < chars.len() {
        let ch = chars[idx];
        if ch == '.' {
            if out.is_empty() {
                return Err(ValuePathParseError::new("path cannot start with '.'"));
            }
            idx += 1;
            out.push(parse_dotted(&chars, &mut idx)?);
            continue;
        }

        if ch == '[' {
            out.push(parse_bracket_segment(&chars, &mut idx)?);
            continue;
        }

        if out.is_empty() {
            out.push(parse_dotted(&chars, &mut idx)?);
            continue;
        }

        return Err(ValuePathParseError::new(format!(
            "unexpected character '{}' at position {}",
            ch, idx
        )));
    }

    Ok(ValuePath::new(out))
}

fn parse_dotted(chars: &[char], idx: &mut usize) -> Result<PathSegment, ValuePathParseError> {
    let start = *idx;
    while *idx < chars.len() {
        let ch = chars[*idx];
        if ch == '.' || ch == '[' || ch == ']' {
            break;
        }
        *idx += 1;
    }
    if *idx == start {
        return Err(ValuePathParseError::new(format!(
            "expected key at position {}",
            start
        )));
    }
    let raw = chars[start..*idx].iter().collect::<String>();
    if raw.chars().all(|ch| ch.is_ascii_digit()) {
        if let Ok(index) = raw.parse::<usize>() {
            return Ok(PathSegment::Index(index));
        }
    }
    Ok(PathSegment::Key(raw))
}

fn parse_bracket_segment(
    chars: &[char],
    idx: &mut usize,
) -> Result<PathSegment, ValuePathParseError> {
    if chars.get(*idx).copied() != Some('[') {
        return Err(ValuePathParseError::new("expected '['"));
    }
    *idx += 1;
    if *idx >= chars.len() {
        return Err(ValuePathParseError::new("unterminated '[' segment"));
    }

    let ch = chars[*idx];
    if ch == '"' || ch == '\'' {
        let quote = ch;
        *idx += 1;
        let mut key = String::new();
        let mut closed = false;
        while *idx < chars.len() {
            let c = chars[*idx];
            *idx += 1;
            if c == '\\' {
                let Some(next) = chars.get(*idx).copied() else {
                    return Err(ValuePathParseError::new("unterminated escape in quoted key"));
                };
                key.push(next);
                *idx += 1;
                continue;
            }
            if c == quote {
                closed = true;
                break;
            }
            key.push(c);
        }
        if !closed {
            return Err(ValuePathParseError::new("unterminated quoted key"));
        }
        if chars.get(*idx).copied() != Some(']') {
            return Err(ValuePathParseError::new("expected closing ']'"));
        }
        *idx += 1;
        return Ok(PathSegment::Key(key));
    }

    let start = *idx;
    while *idx < chars.len() && chars[*idx] != ']' {
        *idx += 1;
    }
    if *idx >= chars.len() {
        return Err(ValuePathParseError::new("unterminated '[' segment"));
    }
    let raw = chars[start..*idx].iter().collect::<String>();
    *idx += 1;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValuePathParseError::new("empty bracket segment"));
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        return Ok(PathSegment::Index(index));
    }
    Ok(PathSegment::Key(trimmed.to_string()))
}

fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
