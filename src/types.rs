use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::SourceError;

/// A config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
    Toml,
    /// `KEY=value` lines, as read by `dotenvy`.
    Env,
}

impl FileFormat {
    /// File extensions tried, in order, when searching for `{name}.{ext}`.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileFormat::Yaml => &["yaml", "yml"],
            FileFormat::Json => &["json"],
            FileFormat::Toml => &["toml"],
            FileFormat::Env => &["env"],
        }
    }

    /// Infer the format of an explicit file path from its name.
    ///
    /// `.env` has no extension as far as `Path` is concerned, so env files are
    /// matched on the file name first.
    pub fn from_path(path: &Path) -> Option<FileFormat> {
        let file_name = path.file_name()?.to_str()?;
        if file_name.ends_with(".env") {
            return Some(FileFormat::Env);
        }
        path.extension()?.to_str()?.parse().ok()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
            FileFormat::Toml => "toml",
            FileFormat::Env => "env",
        }
    }
}

impl FromStr for FileFormat {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "json" => Ok(FileFormat::Json),
            "toml" => Ok(FileFormat::Toml),
            "env" | "dotenv" => Ok(FileFormat::Env),
            _ => Err(SourceError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One read strategy in a resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The named or explicit config file, parsed by its declared format.
    File,
    /// Inject a `.env` file into the process environment, then read env vars.
    DotEnv,
    /// Process environment variables bound from the derived keys.
    Env,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::File => "file",
            Source::DotEnv => "dotenv",
            Source::Env => "env",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_aliases() {
        assert_eq!("yaml".parse::<FileFormat>().unwrap(), FileFormat::Yaml);
        assert_eq!("YML".parse::<FileFormat>().unwrap(), FileFormat::Yaml);
        assert_eq!(".env".parse::<FileFormat>().unwrap(), FileFormat::Env);
        assert_eq!("dotenv".parse::<FileFormat>().unwrap(), FileFormat::Env);
        assert_eq!("toml".parse::<FileFormat>().unwrap(), FileFormat::Toml);
    }

    #[test]
    fn unknown_format_rejected() {
        let err = "ini".parse::<FileFormat>().unwrap_err();
        assert!(matches!(err, SourceError::UnknownFormat(s) if s == "ini"));
    }

    #[test]
    fn infer_from_path() {
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("/etc/app/config.yml")),
            Some(FileFormat::Yaml)
        );
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("/srv/.env")),
            Some(FileFormat::Env)
        );
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("prod.env")),
            Some(FileFormat::Env)
        );
        assert_eq!(FileFormat::from_path(&PathBuf::from("Makefile")), None);
    }
}
