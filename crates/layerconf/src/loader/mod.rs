//! Layered configuration loader.
//!
//! Reads `config.yaml` and, when the environment selector is set,
//! `config.<selector>.yaml` from a [`Source`]. Each file is expanded,
//! decoded into the schema and merged onto the previous layers.


use crate::{ConfigError, Environment, Merge, ProcessEnv, Source, YamlTemplate};
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::io;
use std::marker::PhantomData;

/// Name of the mandatory base config file.
pub const BASE_CONFIG_FILE: &str = "config.yaml";
/// Environment variable naming the active overlay.
pub const DEFAULT_SELECTOR_VAR: &str = "ENV";

/// Name of the overlay file for environment `env`.
pub fn env_config_file(env: &str) -> String {
    format!("config.{env}.yaml")
}

/// Loads a schema `C` from a base file plus an optional environment overlay.
#[derive(Debug, Clone)]
pub struct Loader<C, S, E = ProcessEnv> {
    source: S,
    env: E,
    selector_var: String,
    selector: Option<String>,
    _schema: PhantomData<fn() -> C>,
}

impl<C, S: Source> Loader<C, S, ProcessEnv> {
    /// Loader reading `source` and the process environment.
    pub fn new(source: S) -> Self {
        Self::with_env(source, ProcessEnv)
    }
}

impl<C, S: Source, E: Environment> Loader<C, S, E> {
    /// Loader reading `source` and resolving variables from `env`.
    pub fn with_env(source: S, env: E) -> Self {
        Self {
            source,
            env,
            selector_var: DEFAULT_SELECTOR_VAR.to_string(),
            selector: None,
            _schema: PhantomData,
        }
    }

    /// Read the overlay selector from `var` instead of `ENV`.
    pub fn with_selector_var(mut self, var: impl Into<String>) -> Self {
        self.selector_var = var.into();
        self
    }

    /// Pin the overlay selector, ignoring the selector variable.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Store the config files are read from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Environment used for the selector and placeholders.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Active selector, if any; empty values count as unset.
    pub fn selector(&self) -> Option<String> {
        self.selector
            .clone()
            .or_else(|| self.env.var(&self.selector_var))
            .filter(|selector| !selector.is_empty())
    }

    /// Files a load reads, in merge order.
    pub fn files(&self) -> Vec<String> {
        let mut files = vec![BASE_CONFIG_FILE.to_string()];
        if let Some(selector) = self.selector() {
            files.push(env_config_file(&selector));
        }
        files
    }
}

impl<C, S, E> Loader<C, S, E>
where
    C: DeserializeOwned + Default + Merge,
    S: Source,
    E: Environment,
{
    /// Load every layer and merge them onto a fresh default value.
    ///
    /// The base file must be readable. An overlay that does not exist is
    /// skipped; any other failure aborts the load.
    pub fn load_config(&self) -> Result<C, ConfigError> {
        let files = self.files();
        info!("loading layered config (files={})", files.join(","));
        let template = YamlTemplate::with_env(&self.env);
        let mut merged = C::default();
        let mut layers = 0;

        for (index, file) in files.iter().enumerate() {
            let raw = match self.source.read(file) {
                Ok(raw) => raw,
                Err(err) if index > 0 && err.kind() == io::ErrorKind::NotFound => {
                    debug!("skipping missing overlay (file={file})");
                    continue;
                }
                Err(source) => {
                    return Err(ConfigError::SourceUnavailable {
                        file: file.clone(),
                        source,
                    });
                }
            };

            let expanded = template.expand(file, &raw).map_err(|source| {
                ConfigError::TemplateCompile {
                    file: file.clone(),
                    source,
                }
            })?;
            let layer: C = decode(&expanded).map_err(|source| ConfigError::Unmarshal {
                file: file.clone(),
                source,
            })?;
            merged.merge(layer);
            layers += 1;
            debug!("merged config layer (file={file}, len={})", raw.len());
        }

        info!("layered config loaded (layers={layers})");
        Ok(merged)
    }
}

/// Decode one expanded document; a document without content is the zero value.
fn decode<C: DeserializeOwned + Default>(text: &str) -> Result<C, serde_yaml::Error> {
    if is_blank_document(text) {
        return Ok(C::default());
    }
    serde_yaml::from_str(text)
}

fn is_blank_document(text: &str) -> bool {
    text.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}
