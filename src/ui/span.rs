use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::style::Style;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Display width in terminal cells.
    pub fn width(&self) -> usize {
        UnicodeWidthStr::width(self.text.as_str())
    }
}

pub type SpanLine = Vec<Span>;

pub fn line_width(line: &SpanLine) -> usize {
    line.iter().map(Span::width).sum()
}

pub fn line_text(line: &SpanLine) -> String {
    line.iter().map(|span| span.text.as_str()).collect()
}

/// Truncates `text` to at most `max_width` cells. Line breaks are dropped.
pub fn clip_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut used = 0usize;
    let mut out = String::new();
    for ch in text.chars().filter(|ch| !matches!(ch, '\n' | '\r')) {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used.saturating_add(ch_width) > max_width {
            break;
        }
        out.push(ch);
        used = used.saturating_add(ch_width);
    }
    out
}

pub fn clip_line(line: &SpanLine, max_width: usize) -> SpanLine {
    let mut used = 0usize;
    let mut out = Vec::with_capacity(line.len());
    for span in line {
        let clipped = clip_to_width(&span.text, max_width.saturating_sub(used));
        if clipped.is_empty() {
            continue;
        }
        used = used.saturating_add(UnicodeWidthStr::width(clipped.as_str()));
        out.push(Span::styled(clipped, span.style));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Span, clip_line, clip_to_width, line_text};

    #[test]
    fn clipping_counts_wide_characters() {
        assert_eq!(clip_to_width("日本語", 4), "日本");
        assert_eq!(clip_to_width("abc\ndef", 5), "abcde");
        assert_eq!(clip_to_width("abc", 0), "");
    }

    #[test]
    fn clip_line_stops_at_width() {
        let line = vec![Span::new("Name: "), Span::new("John Smith")];
        assert_eq!(line_text(&clip_line(&line, 10)), "Name: John");
        assert_eq!(clip_line(&line, 4).len(), 1);
    }
}
