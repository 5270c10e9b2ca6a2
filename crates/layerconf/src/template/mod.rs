//! Placeholder expansion for raw YAML text.
//!
//! Placeholders use `${` and `}` so they never collide with YAML flow
//! mappings. Supported actions:
//!
//! - `${getenv "KEY"}` / `${getenv "KEY:default"}` reads an environment
//!   variable, falling back to the default when unset or empty,
//! - `${"text"}` emits a string literal (`${"${"}` writes a literal `${`),
//! - `${/* comment */}` emits nothing,
//! - `${- ...}` and `${... -}` trim whitespace before and after the action.
//!
//! Strings are either `"interpreted"` (escapes `\" \\ \n \t \r`) or
//! `` `raw` ``.

mod parse;


use crate::{Environment, ProcessEnv, TemplateError};
use parse::Node;
use std::borrow::Cow;
use std::io::{Read, Write};

/// Expands `${...}` placeholders against an environment.
///
/// Holds nothing but the environment handle, so one instance can serve any
/// number of concurrent expansions.
#[derive(Debug, Clone, Default)]
pub struct YamlTemplate<E = ProcessEnv> {
    env: E,
}

impl YamlTemplate<ProcessEnv> {
    /// Expander reading the process environment.
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: Environment> YamlTemplate<E> {
    /// Expander reading `env`.
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    /// Expand `text`; `name` only labels errors.
    pub fn expand(&self, name: &str, text: &str) -> Result<String, TemplateError> {
        let nodes = parse::parse(name, text)?;
        Ok(self.render(&nodes).collect())
    }

    /// Read a template from `reader` and write the expansion to `writer`.
    ///
    /// The whole input is parsed before anything is written; a write failure
    /// part way leaves `writer` holding output that must be discarded.
    pub fn compile(
        &self,
        name: &str,
        mut reader: impl Read,
        mut writer: impl Write,
    ) -> Result<(), TemplateError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|source| TemplateError::Read {
                name: name.to_string(),
                source,
            })?;
        let nodes = parse::parse(name, &text)?;
        let execute_err = |source| TemplateError::Execute {
            name: name.to_string(),
            source,
        };
        for piece in self.render(&nodes) {
            writer.write_all(piece.as_bytes()).map_err(execute_err)?;
        }
        writer.flush().map_err(execute_err)
    }

    /// Resolve a `KEY` or `KEY:default` spec against the environment.
    pub fn getenv(&self, spec: &str) -> String {
        getenv(&self.env, spec)
    }

    fn render<'a>(&'a self, nodes: &'a [Node<'a>]) -> impl Iterator<Item = Cow<'a, str>> + 'a {
        nodes.iter().map(move |node| match node {
            Node::Text(text) => Cow::Borrowed(*text),
            Node::Literal(value) => Cow::Borrowed(value.as_str()),
            Node::Getenv(spec) => Cow::Owned(self.getenv(spec)),
        })
    }
}

/// Resolve `KEY` or `KEY:default` against `env`.
///
/// The spec splits on the first colon and both halves are trimmed. A
/// variable set to the empty string counts as unset and yields the default.
pub fn getenv(env: &impl Environment, spec: &str) -> String {
    let (key, default) = match spec.split_once(':') {
        Some((key, default)) => (key.trim(), default.trim()),
        None => (spec.trim(), ""),
    };
    match env.var(key) {
        Some(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
