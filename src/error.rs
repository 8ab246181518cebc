use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::data::DataError;
use crate::core::schema_text::SchemaParseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("schema {path}: {source}")]
    Schema {
        path: PathBuf,
        source: SchemaParseError,
    },
    #[error("data {path}: {source}")]
    Data { path: PathBuf, source: DataError },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to watch schema file: {0}")]
    Watch(#[from] notify::Error),
    #[error("failed to encode JSON output: {0}")]
    EncodeJson(#[from] serde_json::Error),
    #[error("failed to encode YAML output: {0}")]
    EncodeYaml(#[from] serde_yaml::Error),
}
