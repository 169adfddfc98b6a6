//! Config file discovery and parsing.
//!
//! # Discovery
//!
//! An explicit file (`.file()` on the builder) is used as-is; its format is
//! the declared file type or, failing that, is inferred from the file name.
//!
//! Otherwise the file is `{name}.{ext}` for each extension of the declared
//! type, looked up in the configured directory first and then in the current
//! directory. The first existing file wins; later candidates are never read.
//!
//! # Parsing
//!
//! YAML, JSON and TOML documents become a [`Table`] store directly. Env files
//! are read as `KEY=value` pairs and handed to a binder, so they resolve
//! through the same keys and naming convention as process env vars.

use std::path::{Path, PathBuf};

use toml::Table;

use crate::builder::Settings;
use crate::error::SourceError;
use crate::store;
use crate::types::FileFormat;

/// Find the config file described by `settings` and its format.
pub fn locate(settings: &Settings) -> Result<(PathBuf, FileFormat), SourceError> {
    if let Some(file) = &settings.file {
        let format = match &settings.file_type {
            Some(t) => t.parse()?,
            None => FileFormat::from_path(file)
                .ok_or_else(|| SourceError::UnableToDetermineConfigFileFormat(file.clone()))?,
        };
        return locate_explicit(file).map(|path| (path, format));
    }

    let format: FileFormat = settings
        .file_type
        .as_deref()
        .ok_or(SourceError::MissingFileType)?
        .parse()?;
    search(&settings.name, format, settings.file_path.as_deref()).map(|path| (path, format))
}

/// Find the `.env` file described by `settings`.
///
/// Same rules as [`locate`], with the format pinned to env.
pub fn locate_dotenv(settings: &Settings) -> Result<PathBuf, SourceError> {
    match &settings.file {
        Some(file) => locate_explicit(file),
        None => search(&settings.name, FileFormat::Env, settings.file_path.as_deref()),
    }
}

fn locate_explicit(file: &Path) -> Result<PathBuf, SourceError> {
    if file.is_file() {
        Ok(file.to_path_buf())
    } else {
        Err(SourceError::FileNotFound {
            name: file.display().to_string(),
            searched: vec![file.to_path_buf()],
        })
    }
}

/// Look for `{name}.{ext}` in `dir` (if any), then in the current directory.
pub fn search(name: &str, format: FileFormat, dir: Option<&Path>) -> Result<PathBuf, SourceError> {
    let candidates = candidates(name, format, dir);
    match candidates.iter().find(|path| path.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(SourceError::FileNotFound {
            name: format!("{name}.{}", format.extensions()[0]),
            searched: candidates,
        }),
    }
}

fn candidates(name: &str, format: FileFormat, dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs: Vec<&Path> = Vec::new();
    if let Some(dir) = dir {
        dirs.push(dir);
    }
    dirs.push(Path::new("."));

    dirs.iter()
        .flat_map(|dir| {
            format
                .extensions()
                .iter()
                .map(move |ext| dir.join(format!("{name}.{ext}")))
        })
        .collect()
}

/// Read and parse a config file into a store.
///
/// `bind_env_pairs` turns the pairs of an env-format file into a store; it is
/// not called for other formats.
pub fn read(
    path: &Path,
    format: FileFormat,
    bind_env_pairs: impl FnOnce(Vec<(String, String)>) -> Result<Table, SourceError>,
) -> Result<Table, SourceError> {
    if format == FileFormat::Env {
        let pairs = crate::env::read_dotenv(path)?;
        return bind_env_pairs(pairs);
    }

    let content = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(path, format, &content)
}

fn parse(path: &Path, format: FileFormat, content: &str) -> Result<Table, SourceError> {
    let parsed = match format {
        FileFormat::Toml => toml::from_str::<Table>(content).map_err(|e| e.to_string()),
        FileFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
            .map_err(|e| e.to_string())
            .and_then(store::from_yaml),
        FileFormat::Json => serde_json::from_str::<serde_json::Value>(content)
            .map_err(|e| e.to_string())
            .and_then(store::from_json),
        FileFormat::Env => Err("env files are bound, not parsed".to_string()),
    };

    parsed.map_err(|reason| SourceError::Parse {
        path: path.to_path_buf(),
        format: format.as_str(),
        reason,
    })
}
