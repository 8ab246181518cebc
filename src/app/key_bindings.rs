use std::collections::HashMap;

use crate::app::command::{Command, EditAction};
use crate::terminal::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    pub fn from_event(event: KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

#[derive(Default)]
pub struct KeyBindings {
    bindings: HashMap<KeyBinding, Command>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut manager = Self::default();
        manager.install_defaults();
        manager
    }

    pub fn bind(&mut self, key: KeyBinding, command: Command) {
        self.bindings.insert(key, command);
    }

    /// Bound command for `event`; unbound printable characters insert text.
    pub fn resolve(&self, event: KeyEvent) -> Command {
        if let Some(command) = self.bindings.get(&KeyBinding::from_event(event)) {
            return *command;
        }
        match event.code {
            KeyCode::Char(ch)
                if !event.modifiers.contains(KeyModifiers::CONTROL)
                    && !event.modifiers.contains(KeyModifiers::ALT) =>
            {
                Command::Edit(EditAction::Insert(ch))
            }
            _ => Command::Noop,
        }
    }

    fn install_defaults(&mut self) {
        self.bind(KeyBinding::ctrl(KeyCode::Char('c')), Command::Cancel);
        self.bind(KeyBinding::key(KeyCode::Esc), Command::Cancel);
        self.bind(KeyBinding::ctrl(KeyCode::Char('s')), Command::Submit);

        self.bind(KeyBinding::key(KeyCode::Tab), Command::NextFocus);
        self.bind(KeyBinding::key(KeyCode::Down), Command::NextFocus);
        self.bind(KeyBinding::key(KeyCode::BackTab), Command::PrevFocus);
        self.bind(
            KeyBinding::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Command::PrevFocus,
        );
        self.bind(KeyBinding::key(KeyCode::Up), Command::PrevFocus);
        self.bind(KeyBinding::key(KeyCode::Enter), Command::Activate);

        let edits = [
            (KeyCode::Backspace, EditAction::Backspace),
            (KeyCode::Delete, EditAction::Delete),
            (KeyCode::Left, EditAction::Left),
            (KeyCode::Right, EditAction::Right),
            (KeyCode::Home, EditAction::Home),
            (KeyCode::End, EditAction::End),
        ];
        for (code, action) in edits {
            self.bind(KeyBinding::key(code), Command::Edit(action));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyBinding, KeyBindings};
    use crate::app::command::{Command, EditAction};
    use crate::terminal::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers }
    }

    #[test]
    fn defaults_cover_navigation_and_submit() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.resolve(key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Command::Submit
        );
        assert_eq!(
            bindings.resolve(key(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Command::PrevFocus
        );
        assert_eq!(
            bindings.resolve(key(KeyCode::Esc, KeyModifiers::NONE)),
            Command::Cancel
        );
    }

    #[test]
    fn printable_characters_insert_text() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.resolve(key(KeyCode::Char('J'), KeyModifiers::SHIFT)),
            Command::Edit(EditAction::Insert('J'))
        );
        assert_eq!(
            bindings.resolve(key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            Command::Noop
        );
    }

    #[test]
    fn later_bindings_override_defaults() {
        let mut bindings = KeyBindings::new();
        bindings.bind(KeyBinding::key(KeyCode::Esc), Command::Noop);
        assert_eq!(
            bindings.resolve(key(KeyCode::Esc, KeyModifiers::NONE)),
            Command::Noop
        );
        bindings.bind(KeyBinding::ctrl(KeyCode::Char('x')), Command::Cancel);
        assert_eq!(
            bindings.resolve(key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            Command::Cancel
        );
    }
}
