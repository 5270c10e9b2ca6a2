//! Thread-safe cache around a [`Loader`].

use crate::{ConfigError, Environment, Loader, Merge, ProcessEnv, Source};
use log::{debug, info};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Caches the most recently loaded config behind a mutex.
///
/// The holder starts empty. [`load`](Self::load) reloads on demand and keeps
/// the previous value when the reload fails; [`get`](Self::get) loads once on
/// first access and panics if that load fails. Every check-load-publish
/// sequence runs under the same lock, so callers never observe a partially
/// applied reload.
pub struct ConfigHolder<C, S, E = ProcessEnv> {
    loader: Loader<C, S, E>,
    published: Mutex<Option<Arc<C>>>,
}

impl<C, S, E> ConfigHolder<C, S, E>
where
    C: DeserializeOwned + Default + Merge,
    S: Source,
    E: Environment,
{
    /// Wrap `loader`; nothing is loaded until first use.
    pub fn new(loader: Loader<C, S, E>) -> Self {
        Self {
            loader,
            published: Mutex::new(None),
        }
    }

    /// Loader used for every (re)load.
    pub fn loader(&self) -> &Loader<C, S, E> {
        &self.loader
    }

    /// Load the config and publish it.
    ///
    /// On failure the previously published config, if any, stays in place.
    pub fn load(&self) -> Result<(), ConfigError> {
        let mut published = self.published.lock();
        let config = self.loader.load_config()?;
        *published = Some(Arc::new(config));
        info!("published config");
        Ok(())
    }

    /// Published config, loading it first if nothing has been published.
    ///
    /// # Panics
    ///
    /// Panics when the implicit first load fails; a process cannot run
    /// without its config. Use [`try_get`](Self::try_get) to handle that
    /// failure instead.
    pub fn get(&self) -> Arc<C> {
        match self.try_get() {
            Ok(config) => config,
            Err(err) => panic!("failed to load config: {err}"),
        }
    }

    /// Published config, loading it first if nothing has been published.
    pub fn try_get(&self) -> Result<Arc<C>, ConfigError> {
        let mut published = self.published.lock();
        if let Some(config) = published.as_ref() {
            return Ok(Arc::clone(config));
        }
        debug!("no config published yet; loading");
        let config = Arc::new(self.loader.load_config()?);
        *published = Some(Arc::clone(&config));
        info!("published config");
        Ok(config)
    }

    /// Published config without triggering a load.
    pub fn current(&self) -> Option<Arc<C>> {
        self.published.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySource;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Flags {
        check: bool,
    }

    crate::impl_merge!(Flags { check });

    fn holder(base: &str) -> ConfigHolder<Flags, MemorySource, HashMap<String, String>> {
        let source = MemorySource::new().with_file("config.yaml", base);
        ConfigHolder::new(Loader::with_env(source, HashMap::new()))
    }

    #[test]
    fn starts_uninitialized() {
        let holder = holder("check: true");
        assert!(holder.current().is_none());
        holder.load().expect("load");
        assert!(holder.current().expect("published").check);
    }

    #[test]
    fn failed_first_load_stays_uninitialized() {
        let holder = holder("check: [");
        assert!(holder.load().is_err());
        assert!(holder.current().is_none());
        assert!(holder.try_get().is_err());
    }

    #[test]
    #[should_panic(expected = "failed to load config")]
    fn get_panics_when_first_load_fails() {
        holder("check: ${nope}").get();
    }
}
