#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cancel,
    Submit,
    NextFocus,
    PrevFocus,
    Activate,
    Edit(EditAction),
    Noop,
}

/// Text edits applied to the focused field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}
