use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::app::watch::SchemaWatch;
use crate::app::{AppExit, FormApp, Runtime};
use crate::config::FormConfig;
use crate::core::data::value_to_json;
use crate::core::merge::merge_with_schema;
use crate::core::schema::{generate_default, infer_schema};
use crate::core::schema_text::schema_to_yaml;
use crate::core::validation::validate;
use crate::core::value::Value;
use crate::error::AppError;
use crate::form::session::{FormSession, SessionOptions};
use crate::load::{load_data, load_schema, write_output};
use crate::terminal::{RenderMode, Terminal, TerminalSize};
use crate::ui::frame_json::frame_to_json;
use crate::ui::render::Chrome;

#[derive(Parser)]
#[command(name = "dynform")]
#[command(about = "Schema-driven terminal forms", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open an interactive form and print the submitted data as JSON
    Run(RunArgs),

    /// Validate a data file against a schema and print the error map
    Validate {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        data: PathBuf,
    },

    /// Print the default data tree of a schema
    Defaults {
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Derive a schema from sample data and print it as YAML
    Infer {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Print the form as it would first be drawn, as JSON
    Render(RenderArgs),
}

#[derive(Args)]
pub struct FormSource {
    /// Schema file (YAML, or JSON with a .json extension)
    #[arg(short, long, required_unless_present = "data")]
    pub schema: Option<PathBuf>,

    /// Initial data; without --schema the schema is inferred from it
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Form presentation settings (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: FormSource,

    /// Reload the schema whenever the schema file changes
    #[arg(short, long, requires = "schema")]
    pub watch: bool,

    /// Write submitted data here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append logs to this file (the terminal is owned by the form)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Draw below the prompt instead of on the alternate screen
    #[arg(long)]
    pub inline: bool,

    /// Override the form title
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: FormSource,

    #[arg(long, default_value_t = 80)]
    pub width: u16,

    #[arg(long, default_value_t = 24)]
    pub height: u16,

    /// Render after a submit attempt so every error is visible
    #[arg(long)]
    pub reveal: bool,
}

pub fn execute(cli: Cli) -> Result<ExitCode, AppError> {
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Validate { schema, data } => {
            let schema = load_schema(&schema)?;
            let data = load_data(&data)?;
            let errors = validate(&schema, &data);
            write_output(None, &serde_json::to_string_pretty(&errors)?)?;
            Ok(if errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Defaults { schema } => {
            let schema = load_schema(&schema)?;
            let defaults = value_to_json(&generate_default(&schema));
            write_output(None, &serde_json::to_string_pretty(&defaults)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Infer { data } => {
            let schema = infer_schema(&load_data(&data)?);
            write_output(None, schema_to_yaml(&schema)?.trim_end())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Render(args) => render(args),
    }
}

fn run(args: RunArgs) -> Result<ExitCode, AppError> {
    let mut config = load_config(args.source.config.as_deref())?;
    if let Some(title) = args.title {
        config.title = Some(title);
    }
    if args.inline {
        config.render_mode = RenderMode::Inline;
    }

    let session = build_session(&args.source, &config)?;
    let terminal = Terminal::new()?.with_mode(config.render_mode);
    let mut runtime = Runtime::new(FormApp::new(session), terminal, config);
    if let (true, Some(schema)) = (args.watch, &args.source.schema) {
        runtime = runtime.with_watch(SchemaWatch::new(schema)?);
    }

    match runtime.run()? {
        AppExit::Submitted(value) => {
            let json = serde_json::to_string_pretty(&value_to_json(&value))?;
            write_output(args.output.as_deref(), &json)?;
            Ok(ExitCode::SUCCESS)
        }
        AppExit::Cancelled => {
            info!("form cancelled");
            eprintln!("cancelled");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn render(args: RenderArgs) -> Result<ExitCode, AppError> {
    let config = load_config(args.source.config.as_deref())?;
    let mut session = build_session(&args.source, &config)?;
    if args.reveal {
        session.submit(|_| {});
    }
    let chrome = Chrome {
        title: config.title.as_deref(),
        submit_label: &config.submit_label,
        status: None,
        show_hint: false,
    };
    let frame = FormApp::new(session).frame(chrome);
    let size = TerminalSize {
        width: args.width,
        height: args.height,
    };
    write_output(None, &serde_json::to_string_pretty(&frame_to_json(&frame, size))?)?;
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<FormConfig, AppError> {
    Ok(match path {
        Some(path) => FormConfig::load(path)?,
        None => FormConfig::default(),
    })
}

/// Builds the session for `source`. Initial data is reconciled with the
/// schema the same way a schema reload is.
pub fn build_session(source: &FormSource, config: &FormConfig) -> Result<FormSession, AppError> {
    let data = source.data.as_deref().map(load_data).transpose()?;
    let schema = match (&source.schema, &data) {
        (Some(path), _) => load_schema(path)?,
        (None, Some(data)) => infer_schema(data),
        (None, None) => infer_schema(&Value::empty_object()),
    };
    let session = match data {
        Some(data) => {
            let value = merge_with_schema(&data, &schema);
            FormSession::with_value(schema, value)
        }
        None => FormSession::new(schema),
    };
    Ok(session.with_options(SessionOptions {
        validate_on_edit: config.validate_on_edit,
    }))
}
