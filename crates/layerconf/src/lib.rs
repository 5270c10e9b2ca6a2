//! Layered YAML configuration with environment templating.
//!
//! A load reads a mandatory `config.yaml` and an optional
//! `config.<ENV>.yaml` overlay from a [`Source`], expands `${getenv ...}`
//! placeholders in each file, decodes them into the caller's schema and
//! merges the overlay onto the base. [`ConfigHolder`] caches the merged
//! result and serializes reloads.

pub mod app;
mod env;
mod error;
mod holder;
mod loader;
mod merge;
mod source;
pub mod template;

/// Environment lookups used for the overlay selector and `getenv`.
pub use env::{Environment, ProcessEnv};
/// Public error types returned by loading and template expansion.
pub use error::{ConfigError, TemplateError};
/// Thread-safe cache around a loader.
pub use holder::ConfigHolder;
/// Layered loader and its file naming.
pub use loader::{BASE_CONFIG_FILE, DEFAULT_SELECTOR_VAR, Loader, env_config_file};
/// Override merge used between layers.
pub use merge::Merge;
/// Read-only blob stores that config files are read from.
pub use source::{DirSource, MemorySource, Source};
/// Placeholder expansion for raw YAML text.
pub use template::YamlTemplate;
