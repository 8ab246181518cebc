use std::fs;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::controller::{AppExit, FormApp};
use crate::app::key_bindings::KeyBindings;
use crate::app::watch::SchemaWatch;
use crate::config::FormConfig;
use crate::core::schema_text::TextFormat;
use crate::error::AppError;
use crate::terminal::{Terminal, TerminalEvent};
use crate::ui::render::Chrome;

const POLL_INTERVAL: Duration = Duration::from_millis(120);

pub struct Runtime {
    app: FormApp,
    terminal: Terminal,
    key_bindings: KeyBindings,
    config: FormConfig,
    watch: Option<SchemaWatch>,
}

impl Runtime {
    pub fn new(app: FormApp, terminal: Terminal, config: FormConfig) -> Self {
        Self {
            app,
            terminal,
            key_bindings: KeyBindings::new(),
            config,
            watch: None,
        }
    }

    pub fn with_watch(mut self, watch: SchemaWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    /// Runs the form until it is submitted or cancelled. The terminal is
    /// restored even when the loop fails.
    pub fn run(mut self) -> Result<AppExit, AppError> {
        self.terminal.enter()?;
        let run_result = self.event_loop();
        let exit_result = self.terminal.exit();
        let exit = run_result?;
        exit_result?;
        Ok(exit)
    }

    fn event_loop(&mut self) -> Result<AppExit, AppError> {
        self.render()?;
        loop {
            if let Some(exit) = self.app.take_exit() {
                info!(submitted = matches!(exit, AppExit::Submitted(_)), "form closed");
                return Ok(exit);
            }

            let mut render_requested = self.reload_if_changed();
            match self.terminal.poll_event(POLL_INTERVAL)? {
                TerminalEvent::Key(key) => {
                    self.app.handle(self.key_bindings.resolve(key));
                    render_requested = true;
                }
                TerminalEvent::Resize(size) => {
                    self.terminal.set_size(size);
                    render_requested = true;
                }
                TerminalEvent::Tick => {}
            }

            if render_requested {
                self.render()?;
            }
        }
    }

    fn reload_if_changed(&mut self) -> bool {
        let Some(watch) = &self.watch else {
            return false;
        };
        if !watch.changed() {
            return false;
        }
        let path = watch.path().to_path_buf();
        match fs::read_to_string(&path) {
            Ok(text) => self.app.reload_schema(&text, TextFormat::from_path(&path)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read schema file");
                self.app
                    .report_error(format!("failed to read {}: {err}", path.display()));
            }
        }
        true
    }

    fn render(&mut self) -> Result<(), AppError> {
        let chrome = Chrome {
            title: self.config.title.as_deref(),
            submit_label: &self.config.submit_label,
            status: None,
            show_hint: true,
        };
        let frame = self.app.frame(chrome);
        self.terminal.render_frame(&frame)?;
        Ok(())
    }
}
