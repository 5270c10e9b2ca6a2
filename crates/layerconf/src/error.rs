//! Error types for config loading and template expansion.

use thiserror::Error;

/// Errors returned while loading a layered config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base file could not be read, or an overlay failed for a reason
    /// other than not existing.
    #[error("failed to open config file {file}: {source}")]
    SourceUnavailable {
        file: String,
        source: std::io::Error,
    },
    /// Placeholder expansion failed.
    #[error("failed to compile template {file}: {source}")]
    TemplateCompile { file: String, source: TemplateError },
    /// The expanded text did not decode into the schema.
    #[error("failed to unmarshal YAML {file}: {source}")]
    Unmarshal {
        file: String,
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// Name of the file the failing stage was processing.
    pub fn file(&self) -> &str {
        match self {
            ConfigError::SourceUnavailable { file, .. }
            | ConfigError::TemplateCompile { file, .. }
            | ConfigError::Unmarshal { file, .. } => file,
        }
    }
}

/// Errors returned by [`YamlTemplate`](crate::YamlTemplate).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed placeholder syntax.
    #[error("template: {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },
    /// Reading the raw template input failed.
    #[error("template: {name}: read failed: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },
    /// Writing expanded output failed.
    #[error("template: {name}: write failed: {source}")]
    Execute {
        name: String,
        source: std::io::Error,
    },
}
