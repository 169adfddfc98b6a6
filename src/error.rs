use std::path::PathBuf;
use thiserror::Error;

/// Why a single source could not be read.
///
/// These are the only errors a fallback chain recovers from by moving on to
/// the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Config file '{name}' not found (searched: {})", display_paths(.searched))]
    FileNotFound { name: String, searched: Vec<PathBuf> },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path} as {format}: {reason}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("Unsupported config file type '{0}'")]
    UnknownFormat(String),

    #[error("Unable to determine config file format for {0}")]
    UnableToDetermineConfigFileFormat(PathBuf),

    #[error("No config file type set; call .file_type() or .file() on the builder")]
    MissingFileType,

    #[error("Failed to load dotenv file {path}: {source}")]
    DotEnv {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("Cannot bind environment variable for key '{key}': {reason}")]
    EnvBinding { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum LayerfigError {
    #[error("Invalid config target: {reason}")]
    InvalidTarget { reason: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to decode config: {reason}")]
    Decode { reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Live reload needs a tokio runtime")]
    NoRuntime,

    #[error("Live reload is already active for this loader")]
    AlreadyWatching,

    #[error("Live reload needs a config file, but none could be resolved: {0}")]
    NothingToWatch(SourceError),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl LayerfigError {
    /// True for read failures a fallback chain may skip past.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, LayerfigError::Source(_))
    }

    /// True for failures while copying resolved values onto the target.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, LayerfigError::Decode { .. } | LayerfigError::Config(_))
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_lists_searched_paths() {
        let err = SourceError::FileNotFound {
            name: "config.yaml".into(),
            searched: vec!["/etc/app/config.yaml".into(), "./config.yaml".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("config.yaml"));
        assert!(msg.contains("/etc/app/config.yaml"));
        assert!(msg.contains("./config.yaml"));
    }

    #[test]
    fn source_errors_are_transparent() {
        let err: LayerfigError = SourceError::UnknownFormat("ini".into()).into();
        assert!(err.is_source_failure());
        assert!(!err.is_decode_failure());
        assert!(err.to_string().contains("ini"));
    }

    #[test]
    fn decode_is_not_a_source_failure() {
        let err = LayerfigError::Decode {
            reason: "invalid type".into(),
        };
        assert!(err.is_decode_failure());
        assert!(!err.is_source_failure());
    }

    #[test]
    fn missing_file_type_mentions_builder() {
        let err = SourceError::MissingFileType;
        assert!(err.to_string().contains("file_type"));
    }
}
