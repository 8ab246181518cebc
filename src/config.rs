use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::terminal::RenderMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Presentation settings for the interactive form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    pub title: Option<String>,
    pub submit_label: String,
    /// Validate each field as it is edited instead of waiting for the
    /// first submit.
    pub validate_on_edit: bool,
    pub render_mode: RenderMode,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: None,
            submit_label: "Submit".to_string(),
            validate_on_edit: true,
            render_mode: RenderMode::AltScreen,
        }
    }
}

impl FormConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FormConfig;
    use crate::terminal::RenderMode;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = FormConfig::from_yaml("title: Profile\nrender_mode: inline\n").expect("config");
        assert_eq!(config.title.as_deref(), Some("Profile"));
        assert_eq!(config.render_mode, RenderMode::Inline);
        assert_eq!(config.submit_label, "Submit");
        assert!(config.validate_on_edit);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(FormConfig::from_yaml("").expect("config"), FormConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FormConfig::from_yaml("colour: red\n").is_err());
        assert!(FormConfig::from_yaml("render_mode: fullscreen\n").is_err());
    }
}
