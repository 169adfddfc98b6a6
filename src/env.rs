use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use confique::meta::Expr;
use toml::{Table, Value};

use crate::error::SourceError;
use crate::keys::BindKey;
use crate::naming::NamingConvention;
use crate::store::insert_path;

/// Build a store from environment variables bound to the derived keys.
///
/// Each key's env var name comes from `convention` (and `prefix`, if any). A
/// variable that is not set is simply absent from the store, so the declared
/// default applies later. The value is stored under the convention's spelling
/// of the key; decoding maps it back onto the declared field.
///
/// Takes an iterator so tests can pass synthetic data instead of the process
/// environment, and so a `.env` file's pairs can be bound the same way.
pub fn bind_env(
    keys: &[BindKey],
    convention: NamingConvention,
    prefix: Option<&str>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<Table, SourceError> {
    let vars: HashMap<String, String> = vars.into_iter().collect();
    let mut table = Table::new();

    for key in keys {
        if key.path.is_empty() || key.path.split('.').any(str::is_empty) {
            return Err(SourceError::EnvBinding {
                key: key.path.clone(),
                reason: "empty key segment".into(),
            });
        }

        let name = convention.env_var_name(&key.path, prefix);
        if let Some(raw) = vars.get(&name) {
            let value = parse_env_value(raw, key.default.as_ref());
            insert_path(&mut table, &convention.store_key(&key.path), value);
        }
    }

    Ok(table)
}

/// Snapshot the process environment, skipping entries that are not UTF-8.
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Load a `.env` file into the process environment.
///
/// Variables that are already set keep their values. The injected variables
/// outlive the call.
pub fn inject_dotenv(path: &Path) -> Result<(), SourceError> {
    dotenvy::from_path(path).map_err(|e| dotenv_error(path, e))
}

/// Names a loader first put into the process environment from its `.env`
/// file. Shared between a loader and its live reload session.
#[derive(Debug, Clone, Default)]
pub struct DotEnvKeys(Arc<Mutex<HashSet<String>>>);

impl DotEnvKeys {
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }
}

/// Inject a `.env` file and return the variables to bind.
///
/// A variable that was set before the loader injected it keeps winning. A
/// variable the loader injected follows the file on every later read, even
/// though the process still holds the first injected value: an edited value
/// replaces it and a removed line drops it.
pub fn dotenv_vars(
    path: &Path,
    owned: &DotEnvKeys,
) -> Result<Vec<(String, String)>, SourceError> {
    let pairs = read_dotenv(path)?;
    let mut vars: HashMap<String, String> = process_vars().into_iter().collect();

    let mut owned = owned.lock();
    for (key, _) in &pairs {
        if !vars.contains_key(key) {
            owned.insert(key.clone());
        }
    }
    inject_dotenv(path)?;

    vars.retain(|key, _| !owned.contains(key));
    for (key, value) in pairs {
        if owned.contains(&key) {
            vars.insert(key, value);
        }
    }
    Ok(vars.into_iter().collect())
}

/// Read a `.env` file's pairs without touching the process environment.
pub fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>, SourceError> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(path, e))?;
    iter.collect::<Result<Vec<_>, _>>()
        .map_err(|e| dotenv_error(path, e))
}

fn dotenv_error(path: &Path, err: dotenvy::Error) -> SourceError {
    match err {
        dotenvy::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            SourceError::FileNotFound {
                name: path.display().to_string(),
                searched: vec![path.to_path_buf()],
            }
        }
        other => SourceError::DotEnv {
            path: path.to_path_buf(),
            source: other,
        },
    }
}

/// Parse an env var value into a typed store value.
///
/// The declared default, when there is one, says what type the field wants:
/// a string default keeps the raw text even if it looks like a number.
/// Without a hint the text is kept; decoding parses it if the field asks for
/// a number or a bool.
fn parse_env_value(s: &str, hint: Option<&Expr>) -> Value {
    match hint {
        Some(Expr::Str(_)) => Value::String(s.to_string()),
        Some(Expr::Bool(_)) => parse_bool(s).unwrap_or_else(|| Value::String(s.to_string())),
        Some(Expr::Integer(_)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(s.to_string())),
        Some(Expr::Float(_)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(s.to_string())),
        _ => Value::String(s.to_string()),
    }
}

fn parse_bool(s: &str) -> Option<Value> {
    if s.eq_ignore_ascii_case("true") {
        Some(Value::Boolean(true))
    } else if s.eq_ignore_ascii_case("false") {
        Some(Value::Boolean(false))
    } else {
        None
    }
}
