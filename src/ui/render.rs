use crate::form::focus::FocusTarget;
use crate::form::tree::FormNode;
use crate::terminal::CursorPos;
use crate::terminal::text_edit::cursor_column;
use crate::ui::span::{Span, SpanLine, line_width};
use crate::ui::style::{Color, Style};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub lines: Vec<SpanLine>,
    pub cursor: Option<CursorPos>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Success(String),
    Error(String),
}

/// Everything drawn around the form tree itself.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    pub title: Option<&'a str>,
    pub submit_label: &'a str,
    pub status: Option<&'a Status>,
    pub show_hint: bool,
}

impl Default for Chrome<'_> {
    fn default() -> Self {
        Self {
            title: None,
            submit_label: "Submit",
            status: None,
            show_hint: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FocusView<'a> {
    pub target: Option<&'a FocusTarget>,
    /// Char offset of the edit cursor inside the focused field.
    pub cursor: usize,
}

const HINT: &str = "tab/shift-tab move, enter activate, ctrl-s submit, esc cancel";

pub fn render_form(root: &FormNode, focus: FocusView<'_>, chrome: &Chrome<'_>) -> RenderFrame {
    let mut painter = Painter {
        frame: RenderFrame::default(),
        focus,
    };

    if let Some(title) = chrome.title {
        painter.push(vec![Span::styled(title, Style::new().color(Color::Cyan).bold())]);
        painter.push(Vec::new());
    }

    painter.node(root, 0, None);

    painter.push(Vec::new());
    let focused = painter.is_focused(&FocusTarget::Submit);
    let button_style = if focused {
        Style::new().color(Color::Cyan).bold()
    } else {
        Style::new()
    };
    painter.push(vec![
        marker(focused),
        Span::styled(format!("[ {} ]", chrome.submit_label), button_style),
    ]);

    if let Some(status) = chrome.status {
        let (text, color) = match status {
            Status::Info(text) => (text, Color::Yellow),
            Status::Success(text) => (text, Color::Green),
            Status::Error(text) => (text, Color::Red),
        };
        painter.push(vec![Span::styled(text.as_str(), Style::new().color(color))]);
    }
    if chrome.show_hint {
        painter.push(vec![Span::styled(HINT, Style::new().color(Color::DarkGrey))]);
    }

    painter.frame
}

struct Painter<'a> {
    frame: RenderFrame,
    focus: FocusView<'a>,
}

impl Painter<'_> {
    fn push(&mut self, line: SpanLine) {
        self.frame.lines.push(line);
    }

    fn is_focused(&self, target: &FocusTarget) -> bool {
        self.focus.target == Some(target)
    }

    fn node(&mut self, node: &FormNode, depth: usize, label: Option<String>) {
        match node {
            FormNode::Field {
                path,
                label: own_label,
                value,
                required,
                error,
                ..
            } => {
                let focused = self.is_focused(&FocusTarget::Field(path.clone()));
                let label = label.unwrap_or_else(|| own_label.clone());
                let label_style = if focused {
                    Style::new().bold()
                } else {
                    Style::new()
                };
                let mut line = vec![marker(focused), indent(depth), Span::styled(label, label_style)];
                if *required {
                    line.push(Span::styled(" *", Style::new().color(Color::Red)));
                }
                line.push(Span::new(": "));
                if focused {
                    let col = line_width(&line) + cursor_column(value, self.focus.cursor);
                    self.frame.cursor = Some(CursorPos {
                        col: col.min(u16::MAX as usize) as u16,
                        row: self.frame.lines.len().min(u16::MAX as usize) as u16,
                    });
                }
                line.push(Span::new(value.as_str()));
                self.push(line);
                self.error(depth, error.as_deref());
            }
            FormNode::Group {
                label: own_label,
                children,
                error,
                ..
            } => {
                let label = label.unwrap_or_else(|| own_label.clone());
                let child_depth = if label.is_empty() && depth == 0 {
                    0
                } else {
                    self.header(depth, label);
                    depth + 1
                };
                self.error(child_depth, error.as_deref());
                for child in children {
                    self.node(child, child_depth, None);
                }
            }
            FormNode::List {
                path,
                label: own_label,
                items,
                error,
            } => {
                let label = label.unwrap_or_else(|| own_label.clone());
                self.header(depth, label.clone());
                self.error(depth + 1, error.as_deref());
                for (index, item) in items.iter().enumerate() {
                    let item_label = numbered(item.label(), index);
                    self.node(item, depth + 1, Some(item_label.clone()));
                    let focused = self.is_focused(&FocusTarget::Remove(path.clone(), index));
                    self.push(vec![
                        marker(focused),
                        indent(depth + 1),
                        Span::styled(
                            format!("[x] Remove {item_label}"),
                            action_style(focused, Color::DarkGrey),
                        ),
                    ]);
                }
                let focused = self.is_focused(&FocusTarget::Append(path.clone()));
                self.push(vec![
                    marker(focused),
                    indent(depth + 1),
                    Span::styled(format!("[+] Add {label}"), action_style(focused, Color::Green)),
                ]);
            }
        }
    }

    fn header(&mut self, depth: usize, label: String) {
        self.push(vec![
            marker(false),
            indent(depth),
            Span::styled(label, Style::new().bold()),
        ]);
    }

    fn error(&mut self, depth: usize, error: Option<&str>) {
        if let Some(error) = error {
            self.push(vec![
                marker(false),
                indent(depth),
                Span::styled(format!("! {error}"), Style::new().color(Color::Red)),
            ]);
        }
    }
}

fn marker(focused: bool) -> Span {
    if focused {
        Span::styled("> ", Style::new().color(Color::Cyan).bold())
    } else {
        Span::new("  ")
    }
}

fn indent(depth: usize) -> Span {
    Span::new("  ".repeat(depth))
}

fn numbered(label: &str, index: usize) -> String {
    if label.is_empty() {
        format!("#{}", index + 1)
    } else {
        format!("{label} #{}", index + 1)
    }
}

fn action_style(focused: bool, color: Color) -> Style {
    let style = Style::new().color(color);
    if focused { style.bold() } else { style }
}

#[cfg(test)]
mod tests {
    use super::{Chrome, FocusView, Status, render_form};
    use crate::core::schema::SchemaNode;
    use crate::core::value_path::ValuePath;
    use crate::form::focus::FocusTarget;
    use crate::form::session::FormSession;
    use crate::terminal::CursorPos;
    use crate::ui::span::line_text;

    fn session() -> FormSession {
        let schema = SchemaNode::object("")
            .field("name", SchemaNode::text("Name").required())
            .field(
                "hobbies",
                SchemaNode::array("Hobbies", SchemaNode::text("Hobbies").required()),
            );
        let mut session = FormSession::new(schema);
        let hobbies = ValuePath::parse("hobbies").expect("path");
        session.append(&hobbies).expect("append");
        session
            .edit(&hobbies.index(0), "Reading")
            .expect("edit");
        session
    }

    fn texts(frame: &super::RenderFrame) -> Vec<String> {
        frame.lines.iter().map(line_text).collect()
    }

    #[test]
    fn draws_fields_lists_and_submit_row() {
        let session = session();
        let chrome = Chrome {
            title: Some("Profile"),
            show_hint: false,
            ..Chrome::default()
        };
        let frame = render_form(&session.render(), FocusView::default(), &chrome);
        assert_eq!(
            texts(&frame),
            vec![
                "Profile",
                "",
                "  Name *: ",
                "  Hobbies",
                "    Hobbies #1 *: Reading",
                "    [x] Remove Hobbies #1",
                "    [+] Add Hobbies",
                "",
                "  [ Submit ]",
            ]
        );
        assert_eq!(frame.cursor, None);
    }

    #[test]
    fn focused_field_places_cursor_after_label() {
        let session = session();
        let target = FocusTarget::Field(ValuePath::parse("hobbies.0").expect("path"));
        let focus = FocusView {
            target: Some(&target),
            cursor: 4,
        };
        let chrome = Chrome {
            show_hint: false,
            ..Chrome::default()
        };
        let frame = render_form(&session.render(), focus, &chrome);
        assert_eq!(texts(&frame)[2], ">   Hobbies #1 *: Reading");
        assert_eq!(frame.cursor, Some(CursorPos { col: 22, row: 2 }));
    }

    #[test]
    fn errors_and_status_follow_submit() {
        let mut session = session();
        session.submit(|_| {});
        let status = Status::Error("1 field needs attention".to_string());
        let chrome = Chrome {
            status: Some(&status),
            show_hint: false,
            ..Chrome::default()
        };
        let frame = render_form(&session.render(), FocusView::default(), &chrome);
        let lines = texts(&frame);
        assert_eq!(lines[1], "  ! Name is required");
        assert_eq!(lines.last().map(String::as_str), Some("1 field needs attention"));
    }
}
