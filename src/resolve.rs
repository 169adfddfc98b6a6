//! Resolution pipeline: pick a source, read it into a store, decode the store.
//!
//! Unlike a merge of every layer, exactly one source fills the store on each
//! load. Which sources are tried, and in what order, is a [`ReadPlan`] built
//! from the loader's settings. Steps:
//!
//! 1. Reject a schema whose sibling fields cannot be told apart
//! 2. Derive bind keys from the schema
//! 3. Run the plan; the first source that reads successfully wins
//! 4. Reconcile the store's keys with the declared field names
//! 5. Deserialize into `C::Layer`
//! 6. Let confique fill defaults (if enabled) and check required fields

use std::path::PathBuf;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};
use tracing::{debug, info};

use crate::builder::Settings;
use crate::env::{self, DotEnvKeys};
use crate::error::{LayerfigError, SourceError};
use crate::file;
use crate::keys::{self, BindKey};
use crate::lenient::Lenient;
use crate::store;
use crate::types::Source;

/// The ordered sources one load may try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPlan {
    primary: Source,
    fallbacks: Vec<Source>,
}

impl ReadPlan {
    /// With fallback: file, then the `.env` file (if the configured file is
    /// one), then process env. Without: exactly one source.
    pub fn for_settings(settings: &Settings) -> Self {
        let env_file = settings.is_env_file();

        if settings.fallback {
            let mut fallbacks = Vec::new();
            if env_file {
                fallbacks.push(Source::DotEnv);
            }
            fallbacks.push(Source::Env);
            return Self {
                primary: Source::File,
                fallbacks,
            };
        }

        let primary = if env_file {
            Source::DotEnv
        } else if settings.use_env {
            Source::Env
        } else {
            Source::File
        };
        Self {
            primary,
            fallbacks: Vec::new(),
        }
    }

    pub fn sources(&self) -> Vec<Source> {
        std::iter::once(self.primary)
            .chain(self.fallbacks.iter().copied())
            .collect()
    }
}

/// What the winning source produced.
#[derive(Debug)]
pub struct SourceRead {
    pub source: Source,
    /// The file that was read, if the source is file-backed.
    pub path: Option<PathBuf>,
    pub table: Table,
}

/// Try each source of `plan` in order until one reads successfully.
///
/// Read failures move on to the next source; when every source fails, the
/// last failure is returned.
pub fn run_chain(
    plan: &ReadPlan,
    mut read: impl FnMut(Source) -> Result<(Option<PathBuf>, Table), SourceError>,
) -> Result<SourceRead, SourceError> {
    let mut source = plan.primary;
    let mut result = read(source);

    for &next in &plan.fallbacks {
        match &result {
            Ok(_) => break,
            Err(e) => {
                debug!(%source, next = %next, error = %e, "source failed, falling back");
            }
        }
        source = next;
        result = read(source);
    }

    let (path, table) = result?;
    Ok(SourceRead {
        source,
        path,
        table,
    })
}

/// Read one source into a store.
///
/// `dotenv_keys` remembers which variables this loader injected from its
/// `.env` file, so a later read binds the file's current values for them.
pub fn read_source(
    settings: &Settings,
    keys: &[BindKey],
    dotenv_keys: &DotEnvKeys,
    source: Source,
) -> Result<(Option<PathBuf>, Table), SourceError> {
    let convention = settings.naming();
    let prefix = settings.env_prefix.as_deref();

    match source {
        Source::File => {
            let (path, format) = file::locate(settings)?;
            debug!(path = %path.display(), %format, "reading config file");
            let table = file::read(&path, format, |pairs| {
                env::bind_env(keys, convention, prefix, pairs)
            })?;
            Ok((Some(path), table))
        }
        Source::DotEnv => {
            let path = file::locate_dotenv(settings)?;
            debug!(path = %path.display(), "injecting dotenv file");
            let vars = env::dotenv_vars(&path, dotenv_keys)?;
            let table = env::bind_env(keys, convention, prefix, vars)?;
            Ok((Some(path), table))
        }
        Source::Env => {
            let table = env::bind_env(keys, convention, prefix, env::process_vars())?;
            Ok((None, table))
        }
    }
}

/// Run the full pipeline for `C` and return the config with the file it came
/// from (if any).
pub fn resolve<C: Config>(
    settings: &Settings,
    dotenv_keys: &DotEnvKeys,
) -> Result<(C, Option<PathBuf>), LayerfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    keys::check_unambiguous(&C::META)?;
    let keys = keys::derive_keys(&C::META);
    let plan = ReadPlan::for_settings(settings);

    let read = run_chain(&plan, |source| read_source(settings, &keys, dotenv_keys, source))?;
    info!(
        source = %read.source,
        path = ?read.path,
        keys = read.table.len(),
        "config source resolved"
    );

    let config = decode::<C>(read.table, settings.use_defaults)?;
    Ok((config, read.path))
}

/// Decode a store onto `C`.
///
/// With `use_defaults`, declared defaults sit underneath the store; without,
/// every required field must come from the store. Scalars are converted to
/// whatever type each field asks for (see [`Lenient`]).
pub fn decode<C: Config>(table: Table, use_defaults: bool) -> Result<C, LayerfigError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    let table = store::reconcile(&C::META, table);

    let layer = <C::Layer as Deserialize>::deserialize(Lenient(Value::Table(table)))
        .map_err(|e| LayerfigError::Decode {
            reason: e.to_string(),
        })?;

    let config = if use_defaults {
        C::builder().preloaded(layer).load()?
    } else {
        C::from_layer(layer)?
    };
    debug!(config = C::META.name, use_defaults, "config decoded");
    Ok(config)
}
