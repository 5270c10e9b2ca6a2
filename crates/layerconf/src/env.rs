//! Environment variable lookups.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

/// Read access to environment variables.
///
/// Implemented for the process environment and for plain string maps, so
/// loads can be driven by an injected environment.
pub trait Environment: Send + Sync {
    /// Value of `key`, or `None` when unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        if key.is_empty() || key.contains(['=', '\0']) {
            return None;
        }
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher + Send + Sync> Environment for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: Environment + ?Sized> Environment for &T {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

impl<T: Environment + ?Sized> Environment for Arc<T> {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
