use crossterm::cursor::{Hide, MoveTo, Show, position};
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode as CrosstermKeyCode, KeyEvent as CrosstermKeyEvent,
    KeyEventKind, KeyModifiers as CrosstermKeyModifiers,
};
use crossterm::style::{
    Attribute, Color as CrosstermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
    SetForegroundColor,
};
use crossterm::terminal::{
    self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
    EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen, ScrollUp,
};
use crossterm::{execute, queue};
use serde::Deserialize;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use crate::ui::render::RenderFrame;
use crate::ui::span::{SpanLine, clip_line};
use crate::ui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    AltScreen,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Unknown,
    Char(char),
    Enter,
    Tab,
    BackTab,
    Esc,
    Backspace,
    Delete,
    Home,
    End,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyModifiers(u8);

impl KeyModifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const CONTROL: Self = Self(1 << 1);
    pub const ALT: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for KeyModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEvent {
    Key(KeyEvent),
    Resize(TerminalSize),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub col: u16,
    pub row: u16,
}

pub struct Terminal {
    stdout: Stdout,
    size: TerminalSize,
    mode: RenderMode,
    /// First screen row of the form block in inline mode.
    block_start_row: u16,
    last_drawn_count: usize,
    last_frame: Vec<SpanLine>,
}

impl Terminal {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self {
            stdout: io::stdout(),
            size: TerminalSize { width, height },
            mode: RenderMode::default(),
            block_start_row: 0,
            last_drawn_count: 0,
            last_frame: Vec::new(),
        })
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_size(&mut self, size: TerminalSize) {
        self.size = size;
        if self.mode == RenderMode::Inline && size.height > 0 {
            self.block_start_row = self.block_start_row.min(size.height - 1);
        }
    }

    pub fn refresh_size(&mut self) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        self.set_size(TerminalSize { width, height });
        Ok(())
    }

    pub fn enter(&mut self) -> io::Result<()> {
        self.refresh_size()?;
        terminal::enable_raw_mode()?;
        match self.mode {
            RenderMode::AltScreen => {
                execute!(self.stdout, EnterAlternateScreen, DisableLineWrap, Hide)?;
            }
            RenderMode::Inline => {
                let (_, row) = position()?;
                self.block_start_row = row.min(self.size.height.saturating_sub(1));
                execute!(self.stdout, DisableLineWrap, Hide)?;
            }
        }
        Ok(())
    }

    /// Restores the terminal. In alt-screen mode the last frame is printed to
    /// the main screen so the final form state stays visible.
    pub fn exit(&mut self) -> io::Result<()> {
        match self.mode {
            RenderMode::AltScreen => {
                execute!(self.stdout, LeaveAlternateScreen, EnableLineWrap, Show)?;
                terminal::disable_raw_mode()?;
                let width = self.size.width as usize;
                let lines = std::mem::take(&mut self.last_frame);
                for line in &lines {
                    self.write_span_line(line, width)?;
                    self.stdout.write_all(b"\r\n")?;
                }
            }
            RenderMode::Inline => {
                let last_row = self
                    .block_start_row
                    .saturating_add(self.last_drawn_count as u16)
                    .min(self.size.height.saturating_sub(1));
                queue!(self.stdout, MoveTo(0, last_row))?;
                execute!(self.stdout, EnableLineWrap, Show)?;
                terminal::disable_raw_mode()?;
                self.stdout.write_all(b"\r\n")?;
            }
        }
        self.stdout.flush()
    }

    pub fn poll_event(&mut self, timeout: Duration) -> io::Result<TerminalEvent> {
        if !event::poll(timeout)? {
            return Ok(TerminalEvent::Tick);
        }
        match event::read()? {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                Ok(TerminalEvent::Key(map_key_event(key)))
            }
            CrosstermEvent::Resize(width, height) => {
                Ok(TerminalEvent::Resize(TerminalSize { width, height }))
            }
            _ => Ok(TerminalEvent::Tick),
        }
    }

    pub fn render_frame(&mut self, frame: &RenderFrame) -> io::Result<()> {
        let height = self.size.height as usize;
        let width = self.size.width;
        if height == 0 || width == 0 {
            return Ok(());
        }
        self.last_frame.clone_from(&frame.lines);

        let visible = frame.lines.len().min(height);
        let skip = scroll_offset(frame.lines.len(), height, frame.cursor.map(|c| c.row));

        let block_start = match self.mode {
            RenderMode::AltScreen => {
                queue!(self.stdout, BeginSynchronizedUpdate, Hide, MoveTo(0, 0))?;
                queue!(self.stdout, Clear(ClearType::All))?;
                0
            }
            RenderMode::Inline => {
                let available = height.saturating_sub(self.block_start_row as usize);
                queue!(self.stdout, BeginSynchronizedUpdate, Hide)?;
                if visible > available {
                    let shift = (visible - available) as u16;
                    queue!(
                        self.stdout,
                        MoveTo(0, self.size.height.saturating_sub(1)),
                        ScrollUp(shift)
                    )?;
                    self.block_start_row = self.block_start_row.saturating_sub(shift);
                }
                queue!(
                    self.stdout,
                    MoveTo(0, self.block_start_row),
                    Clear(ClearType::FromCursorDown)
                )?;
                self.block_start_row
            }
        };

        let render_width = usize::from(width.saturating_sub(1).max(1));
        for (row, line) in frame.lines.iter().skip(skip).take(visible).enumerate() {
            queue!(self.stdout, MoveTo(0, block_start + row as u16))?;
            self.write_span_line(line, render_width)?;
        }
        self.last_drawn_count = visible;

        if let Some(cursor) = frame.cursor {
            let row = (cursor.row as usize).saturating_sub(skip);
            if row < visible {
                let col = cursor.col.min(width.saturating_sub(1));
                queue!(self.stdout, MoveTo(col, block_start + row as u16), Show)?;
            }
        }
        queue!(self.stdout, EndSynchronizedUpdate)?;
        self.stdout.flush()
    }

    fn write_span_line(&mut self, line: &SpanLine, width: usize) -> io::Result<()> {
        for span in clip_line(line, width) {
            if let Some(color) = span.style.color {
                queue!(self.stdout, SetForegroundColor(map_color(color)))?;
            }
            if let Some(background) = span.style.background {
                queue!(self.stdout, SetBackgroundColor(map_color(background)))?;
            }
            if span.style.bold {
                queue!(self.stdout, SetAttribute(Attribute::Bold))?;
            }
            queue!(self.stdout, Print(span.text.as_str()), ResetColor)?;
            if span.style.bold {
                queue!(self.stdout, SetAttribute(Attribute::NormalIntensity))?;
            }
        }
        Ok(())
    }
}

/// First frame line to draw so that the cursor row stays on screen.
fn scroll_offset(frame_len: usize, height: usize, cursor_row: Option<u16>) -> usize {
    let max_offset = frame_len.saturating_sub(height);
    match cursor_row {
        Some(row) => (row as usize)
            .saturating_sub(height.saturating_sub(1))
            .min(max_offset),
        None => 0,
    }
}

fn map_color(color: Color) -> CrosstermColor {
    match color {
        Color::Reset => CrosstermColor::Reset,
        Color::DarkGrey => CrosstermColor::DarkGrey,
        Color::Red => CrosstermColor::Red,
        Color::Green => CrosstermColor::Green,
        Color::Yellow => CrosstermColor::DarkYellow,
        Color::Cyan => CrosstermColor::DarkCyan,
        Color::White => CrosstermColor::White,
    }
}

fn map_key_event(key: CrosstermKeyEvent) -> KeyEvent {
    KeyEvent {
        code: map_key_code(key.code),
        modifiers: map_key_modifiers(key.modifiers),
    }
}

fn map_key_code(code: CrosstermKeyCode) -> KeyCode {
    match code {
        CrosstermKeyCode::Char(ch) => KeyCode::Char(ch),
        CrosstermKeyCode::Enter => KeyCode::Enter,
        CrosstermKeyCode::Tab => KeyCode::Tab,
        CrosstermKeyCode::BackTab => KeyCode::BackTab,
        CrosstermKeyCode::Esc => KeyCode::Esc,
        CrosstermKeyCode::Backspace => KeyCode::Backspace,
        CrosstermKeyCode::Delete => KeyCode::Delete,
        CrosstermKeyCode::Home => KeyCode::Home,
        CrosstermKeyCode::End => KeyCode::End,
        CrosstermKeyCode::Left => KeyCode::Left,
        CrosstermKeyCode::Right => KeyCode::Right,
        CrosstermKeyCode::Up => KeyCode::Up,
        CrosstermKeyCode::Down => KeyCode::Down,
        _ => KeyCode::Unknown,
    }
}

fn map_key_modifiers(modifiers: CrosstermKeyModifiers) -> KeyModifiers {
    let mut mapped = KeyModifiers::NONE;
    if modifiers.contains(CrosstermKeyModifiers::SHIFT) {
        mapped = mapped | KeyModifiers::SHIFT;
    }
    if modifiers.contains(CrosstermKeyModifiers::CONTROL) {
        mapped = mapped | KeyModifiers::CONTROL;
    }
    if modifiers.contains(CrosstermKeyModifiers::ALT) {
        mapped = mapped | KeyModifiers::ALT;
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::{KeyCode, KeyModifiers, map_key_code, map_key_modifiers, scroll_offset};
    use crossterm::event::{KeyCode as CrosstermKeyCode, KeyModifiers as CrosstermKeyModifiers};

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_offset(5, 10, Some(4)), 0);
        assert_eq!(scroll_offset(30, 10, Some(3)), 0);
        assert_eq!(scroll_offset(30, 10, Some(15)), 6);
        assert_eq!(scroll_offset(30, 10, Some(29)), 20);
        assert_eq!(scroll_offset(30, 10, None), 0);
    }

    #[test]
    fn maps_crossterm_keys() {
        assert_eq!(map_key_code(CrosstermKeyCode::Char('a')), KeyCode::Char('a'));
        assert_eq!(map_key_code(CrosstermKeyCode::F(1)), KeyCode::Unknown);
        let mods = map_key_modifiers(CrosstermKeyModifiers::CONTROL | CrosstermKeyModifiers::SHIFT);
        assert!(mods.contains(KeyModifiers::CONTROL));
        assert!(mods.contains(KeyModifiers::SHIFT));
        assert!(!mods.contains(KeyModifiers::ALT));
    }
}
