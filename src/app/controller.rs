use tracing::{debug, warn};

use crate::app::command::{Command, EditAction};
use crate::core::schema_text::TextFormat;
use crate::core::value::Value;
use crate::core::value_path::ValuePath;
use crate::form::focus::{FocusTarget, focus_targets};
use crate::form::session::{FormSession, SubmitOutcome};
use crate::terminal::text_edit;
use crate::ui::render::{Chrome, FocusView, RenderFrame, Status, render_form};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppExit {
    Submitted(Value),
    Cancelled,
}

/// Terminal-independent state of the interactive form: the session plus
/// focus, edit cursor and status line.
pub struct FormApp {
    session: FormSession,
    targets: Vec<FocusTarget>,
    focus: usize,
    cursor: usize,
    status: Option<Status>,
    exit: Option<AppExit>,
}

impl FormApp {
    pub fn new(session: FormSession) -> Self {
        let mut app = Self {
            session,
            targets: Vec::new(),
            focus: 0,
            cursor: 0,
            status: None,
            exit: None,
        };
        app.refresh_targets();
        app.cursor_to_end();
        app
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.targets.get(self.focus)
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn take_exit(&mut self) -> Option<AppExit> {
        self.exit.take()
    }

    pub fn frame(&self, chrome: Chrome<'_>) -> RenderFrame {
        let chrome = Chrome {
            status: self.status.as_ref(),
            ..chrome
        };
        let focus = FocusView {
            target: self.focused(),
            cursor: self.cursor,
        };
        render_form(&self.session.render(), focus, &chrome)
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Cancel => self.exit = Some(AppExit::Cancelled),
            Command::Submit => self.submit(),
            Command::NextFocus => self.move_focus(1),
            Command::PrevFocus => self.move_focus(-1),
            Command::Activate => self.activate(),
            Command::Edit(action) => self.edit(action),
            Command::Noop => {}
        }
    }

    pub fn reload_schema(&mut self, text: &str, format: TextFormat) {
        match self.session.replace_schema_text(text, format) {
            Ok(()) => self.status = Some(Status::Info("schema reloaded".to_string())),
            Err(err) => self.status = Some(Status::Error(format!("schema not reloaded: {err}"))),
        }
        self.refresh_targets();
        self.cursor_to_end();
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        self.status = Some(Status::Error(message.into()));
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.targets.len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
        self.cursor_to_end();
    }

    fn focus_on(&mut self, target: &FocusTarget) {
        if let Some(index) = self.targets.iter().position(|t| t == target) {
            self.focus = index;
        }
        self.cursor_to_end();
    }

    /// Focuses the first field of item `index` in the list at `list`, or the
    /// list's add control when there is no such item.
    fn focus_item(&mut self, list: &ValuePath, index: usize) {
        let item = list.index(index);
        let first = self.targets.iter().find(|t| match t {
            FocusTarget::Field(field) => field.starts_with(&item),
            _ => false,
        });
        let target = first
            .cloned()
            .unwrap_or_else(|| FocusTarget::Append(list.clone()));
        self.focus_on(&target);
    }

    fn activate(&mut self) {
        let Some(target) = self.focused().cloned() else {
            return;
        };
        match target {
            FocusTarget::Field(_) => self.move_focus(1),
            FocusTarget::Append(path) => match self.session.append(&path) {
                Ok(index) => {
                    self.refresh_targets();
                    self.focus_item(&path, index);
                }
                Err(err) => self.report_error(err.to_string()),
            },
            FocusTarget::Remove(path, index) => {
                if let Err(err) = self.session.remove(&path, index) {
                    self.report_error(err.to_string());
                }
                self.refresh_targets();
                self.focus_item(&path, index);
            }
            FocusTarget::Submit => self.submit(),
        }
    }

    fn submit(&mut self) {
        let mut submitted = None;
        match self.session.submit(|value| submitted = Some(value.clone())) {
            SubmitOutcome::Submitted => {
                self.status = Some(Status::Success("submitted".to_string()));
                self.exit = submitted.map(AppExit::Submitted);
            }
            SubmitOutcome::Rejected { errors } => {
                let noun = if errors == 1 { "field needs" } else { "fields need" };
                self.status = Some(Status::Error(format!("{errors} {noun} attention")));
                self.refresh_targets();
                let invalid = self.targets.iter().find(|t| match t {
                    FocusTarget::Field(path) => self.session.errors().get_path(path).is_some(),
                    _ => false,
                });
                if let Some(invalid) = invalid.cloned() {
                    self.focus_on(&invalid);
                }
            }
        }
    }

    fn edit(&mut self, action: EditAction) {
        let Some(FocusTarget::Field(path)) = self.focused().cloned() else {
            return;
        };
        let mut text = match self.session.text(&path) {
            Ok(text) => text.to_string(),
            Err(err) => {
                warn!(error = %err, "focused field vanished");
                return;
            }
        };
        let changed = match action {
            EditAction::Insert(ch) => {
                text_edit::insert_char(&mut text, &mut self.cursor, ch);
                true
            }
            EditAction::Backspace => text_edit::backspace_char(&mut text, &mut self.cursor),
            EditAction::Delete => text_edit::delete_char(&mut text, &mut self.cursor),
            EditAction::Left => {
                text_edit::move_left(&mut self.cursor, &text);
                false
            }
            EditAction::Right => {
                text_edit::move_right(&mut self.cursor, &text);
                false
            }
            EditAction::Home => {
                self.cursor = 0;
                false
            }
            EditAction::End => {
                self.cursor = text_edit::char_count(&text);
                false
            }
        };
        if changed {
            self.apply_edit(&path, text);
        }
    }

    fn apply_edit(&mut self, path: &ValuePath, text: String) {
        if let Err(err) = self.session.edit(path, text) {
            self.report_error(err.to_string());
        }
    }

    /// Rebuilds the focus list after the tree changed shape, keeping focus on
    /// the same target when it still exists.
    fn refresh_targets(&mut self) {
        let previous = self.focused().cloned();
        self.targets = focus_targets(&self.session.render());
        let kept = previous.and_then(|previous| self.targets.iter().position(|t| *t == previous));
        self.focus = kept.unwrap_or(self.focus.min(self.targets.len().saturating_sub(1)));
        debug!(targets = self.targets.len(), focus = self.focus, "focus targets rebuilt");
    }

    fn cursor_to_end(&mut self) {
        self.cursor = match self.focused() {
            Some(FocusTarget::Field(path)) => self
                .session
                .text(path)
                .map(text_edit::char_count)
                .unwrap_or(0),
            _ => 0,
        };
    }
}
