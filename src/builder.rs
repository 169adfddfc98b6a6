use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use confique::Config;
use serde::Deserialize;

use crate::env::DotEnvKeys;
use crate::error::LayerfigError;
use crate::keys::{self, BindKey};
use crate::naming::NamingConvention;
use crate::resolve;
use crate::types::FileFormat;
use crate::watch::{LiveConfig, WatchSession};

/// Entry point for building a layerfig loader.
pub struct Layerfig;

impl Layerfig {
    pub fn builder<C: Config>() -> LayerfigBuilder<C> {
        LayerfigBuilder::new()
    }

    /// A loader with the conventional setup: `config.yaml` searched in `../`
    /// and then the current directory, env vars as a fallback, declared
    /// defaults underneath.
    pub fn default_loader<C: Config>() -> Loader<C> {
        Self::builder()
            .name("config")
            .file_path("../")
            .file_type("yaml")
            .use_env()
            .use_defaults()
            .snake_case_env_vars(true)
            .enable_fallback()
            .build()
    }
}

/// Everything a [`Loader`] needs to know about where config comes from.
///
/// Produced once by [`LayerfigBuilder::build`] and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base name of the config file, without extension.
    pub name: String,
    /// Explicit config file. When set, `name` and `file_path` are ignored.
    pub file: Option<PathBuf>,
    /// Directory searched before the current directory.
    pub file_path: Option<PathBuf>,
    /// Declared file format (`yaml`, `json`, `toml`, `env`).
    pub file_type: Option<String>,
    pub use_env: bool,
    pub env_prefix: Option<String>,
    pub use_defaults: bool,
    pub snake_case_env_vars: bool,
    pub fallback: bool,
    /// Quiet period after a file change before live reload re-reads.
    pub reload_debounce: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: String::new(),
            file: None,
            file_path: None,
            file_type: None,
            use_env: false,
            env_prefix: None,
            use_defaults: false,
            snake_case_env_vars: true,
            fallback: false,
            reload_debounce: Duration::from_millis(100),
        }
    }
}

impl Settings {
    pub fn naming(&self) -> NamingConvention {
        if self.snake_case_env_vars {
            NamingConvention::SnakeCase
        } else {
            NamingConvention::Collapsed
        }
    }

    /// Whether the configured file is a `.env` file, by declared type or,
    /// for an explicit file without one, by its name.
    pub fn is_env_file(&self) -> bool {
        let format = match (&self.file_type, &self.file) {
            (Some(t), _) => t.parse::<FileFormat>().ok(),
            (None, Some(file)) => FileFormat::from_path(file),
            (None, None) => None,
        };
        format == Some(FileFormat::Env)
    }
}

/// Builder for configuring a [`Loader`].
///
/// Every source is off until asked for: no env vars, no defaults, no
/// fallback. Snake-case env var names are the one default that is on.
pub struct LayerfigBuilder<C: Config> {
    settings: Settings,
    _phantom: PhantomData<fn() -> C>,
}

impl<C: Config> LayerfigBuilder<C> {
    fn new() -> Self {
        Self {
            settings: Settings::default(),
            _phantom: PhantomData,
        }
    }

    /// Base name of the config file (`"app"` finds `app.yaml`, `app.yml`...).
    pub fn name(mut self, name: &str) -> Self {
        self.settings.name = name.to_string();
        self
    }

    /// Load exactly this file instead of searching by name.
    ///
    /// The format comes from [`file_type()`](Self::file_type) if set,
    /// otherwise from the file's extension.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.file = Some(path.into());
        self
    }

    /// Directory to search before the current directory.
    pub fn file_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.file_path = Some(dir.into());
        self
    }

    /// Declared file format: `yaml`/`yml`, `json`, `toml` or `env`/`dotenv`.
    pub fn file_type(mut self, file_type: &str) -> Self {
        self.settings.file_type = Some(file_type.to_string());
        self
    }

    /// Read process environment variables.
    pub fn use_env(mut self) -> Self {
        self.settings.use_env = true;
        self
    }

    pub fn no_env(mut self) -> Self {
        self.settings.use_env = false;
        self
    }

    /// Prefix for env var names: `"myapp"` binds `port` to `MYAPP_PORT`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.settings.env_prefix = Some(prefix.to_string());
        self
    }

    /// Fill fields no source provides from `#[config(default = ...)]`.
    pub fn use_defaults(mut self) -> Self {
        self.settings.use_defaults = true;
        self
    }

    pub fn no_defaults(mut self) -> Self {
        self.settings.use_defaults = false;
        self
    }

    /// Env var naming: `true` (default) gives `SERVER_CONFIG_PORT`, `false`
    /// gives `SERVERCONFIGPORT`.
    pub fn snake_case_env_vars(mut self, enabled: bool) -> Self {
        self.settings.snake_case_env_vars = enabled;
        self
    }

    /// Try the file first, then the `.env` file, then env vars, using the
    /// first that reads.
    pub fn enable_fallback(mut self) -> Self {
        self.settings.fallback = true;
        self
    }

    /// Use exactly one source; a failure to read it fails the load.
    pub fn disable_fallback(mut self) -> Self {
        self.settings.fallback = false;
        self
    }

    /// Quiet period live reload waits for after a change (default 100ms).
    pub fn reload_debounce(mut self, debounce: Duration) -> Self {
        self.settings.reload_debounce = debounce;
        self
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn build(self) -> Loader<C> {
        Loader {
            settings: self.settings,
            dotenv_keys: DotEnvKeys::default(),
            watch: Mutex::new(None),
            _phantom: PhantomData,
        }
    }

    /// Shortcut for `build().load()`.
    pub fn load(self) -> Result<C, LayerfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        self.build().load()
    }
}

/// Loads `C` from its configured sources.
///
/// A loader is immutable once built. It may be loaded from any number of
/// times and owns at most one live reload session.
pub struct Loader<C: Config> {
    pub(crate) settings: Settings,
    pub(crate) dotenv_keys: DotEnvKeys,
    pub(crate) watch: Mutex<Option<WatchSession>>,
    _phantom: PhantomData<fn() -> C>,
}

impl<C: Config> Loader<C> {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The dotted keys this loader binds, in declaration order.
    pub fn bind_keys(&self) -> Vec<BindKey> {
        keys::derive_keys(&C::META)
    }

    /// Resolve and decode the config.
    pub fn load(&self) -> Result<C, LayerfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        resolve::resolve::<C>(&self.settings, &self.dotenv_keys).map(|(config, _)| config)
    }

    /// Load into an existing value. `target` is left untouched on failure.
    pub fn load_into(&self, target: &mut C) -> Result<(), LayerfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        *target = self.load()?;
        Ok(())
    }

    /// Load into a [`LiveConfig`] that live reload can later swap.
    pub fn load_live(&self) -> Result<LiveConfig<C>, LayerfigError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        self.load().map(LiveConfig::new)
    }

    pub(crate) fn watch_session(&self) -> std::sync::MutexGuard<'_, Option<WatchSession>> {
        self.watch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
