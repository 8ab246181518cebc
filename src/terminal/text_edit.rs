//! Cursor-aware editing of a single-line text buffer. Cursors count chars,
//! not bytes.

use unicode_width::UnicodeWidthChar;

pub fn char_count(value: &str) -> usize {
    value.chars().count()
}

pub fn clamp_cursor(cursor: usize, value: &str) -> usize {
    cursor.min(char_count(value))
}

pub fn insert_char(value: &mut String, cursor: &mut usize, ch: char) {
    let pos = clamp_cursor(*cursor, value);
    value.insert(byte_index_at_char(value, pos), ch);
    *cursor = pos + 1;
}

pub fn backspace_char(value: &mut String, cursor: &mut usize) -> bool {
    let pos = clamp_cursor(*cursor, value);
    if pos == 0 {
        return false;
    }
    value.remove(byte_index_at_char(value, pos - 1));
    *cursor = pos - 1;
    true
}

pub fn delete_char(value: &mut String, cursor: &mut usize) -> bool {
    let pos = clamp_cursor(*cursor, value);
    if pos >= char_count(value) {
        return false;
    }
    value.remove(byte_index_at_char(value, pos));
    *cursor = pos;
    true
}

pub fn move_left(cursor: &mut usize, value: &str) -> bool {
    let pos = clamp_cursor(*cursor, value);
    if pos == 0 {
        return false;
    }
    *cursor = pos - 1;
    true
}

pub fn move_right(cursor: &mut usize, value: &str) -> bool {
    let pos = clamp_cursor(*cursor, value);
    if pos >= char_count(value) {
        return false;
    }
    *cursor = pos + 1;
    true
}

/// Terminal cells occupied by the first `cursor` chars.
pub fn cursor_column(value: &str, cursor: usize) -> usize {
    value
        .chars()
        .take(cursor)
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn byte_index_at_char(value: &str, char_idx: usize) -> usize {
    value
        .char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_by_char() {
        let mut value = String::from("zoë");
        let mut cursor = 3;
        insert_char(&mut value, &mut cursor, '!');
        assert_eq!(value, "zoë!");
        assert_eq!(cursor, 4);

        assert!(move_left(&mut cursor, &value));
        assert!(move_left(&mut cursor, &value));
        assert!(backspace_char(&mut value, &mut cursor));
        assert_eq!(value, "zë!");
        assert_eq!(cursor, 1);

        assert!(delete_char(&mut value, &mut cursor));
        assert_eq!(value, "z!");
    }

    #[test]
    fn edges_are_no_ops() {
        let mut value = String::from("ab");
        let mut cursor = 0;
        assert!(!backspace_char(&mut value, &mut cursor));
        assert!(!move_left(&mut cursor, &value));
        cursor = 10;
        assert!(!move_right(&mut cursor, &value));
        assert!(!delete_char(&mut value, &mut cursor));
        assert_eq!(value, "ab");
    }

    #[test]
    fn cursor_column_uses_cell_width() {
        assert_eq!(cursor_column("日本", 1), 2);
        assert_eq!(cursor_column("abc", 2), 2);
        assert_eq!(cursor_column("abc", 9), 3);
    }
}
