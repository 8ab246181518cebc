use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use dynform::cli::{Cli, Commands, execute};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli) {
        eprintln!("warning: logging disabled: {err}");
    }

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("DYNFORM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("dynform=warn"))
}

/// The interactive form owns the terminal, so it only logs when a log file
/// is given. Every other command logs to stderr.
fn init_tracing(cli: &Cli) -> io::Result<()> {
    match &cli.command {
        Commands::Run(args) => match &args.log_file {
            Some(path) => init_file_logging(path),
            None => Ok(()),
        },
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .init();
            Ok(())
        }
    }
}

fn init_file_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
