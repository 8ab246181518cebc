pub mod backend;
pub mod text_edit;

pub use backend::{
    CursorPos, KeyCode, KeyEvent, KeyModifiers, RenderMode, Terminal, TerminalEvent, TerminalSize,
};
