//! Clap adapter for layerfig.
//!
//! Compiled only with the `clap` Cargo feature (on by default). It gives an
//! application the usual `--config`, `--type` and `--prefix` flags and turns
//! them into builder calls, so the flags can override whatever the
//! application configured in code.
//!
//! If you use a different CLI parser (or no CLI at all), skip this module and
//! call the builder methods directly.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use confique::Config;

use crate::builder::LayerfigBuilder;

/// Clap-derived flags that pick where config comes from.
///
/// Flatten it into your app's parser:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     loader: LoaderArgs,
/// }
/// ```
#[derive(Debug, Clone, Default, Args)]
pub struct LoaderArgs {
    /// Config file to load instead of searching for one.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where config comes from.
    ///
    /// `yaml`, `json` and `toml` read only the config file. `env` reads only
    /// environment variables. `.env` loads a `.env` file next to `--config`
    /// (or in the current directory) and falls back to environment variables.
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub source_type: Option<SourceType>,

    /// Prefix for environment variable names.
    #[arg(short = 'p', long = "prefix")]
    pub prefix: Option<String>,
}

/// Values accepted by `--type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceType {
    Yaml,
    Json,
    Toml,
    Env,
    #[value(name = ".env")]
    DotEnv,
}

impl LoaderArgs {
    /// Apply the parsed flags on top of `builder`. Flags that were not given
    /// leave the builder as it was.
    pub fn apply<C: Config>(&self, mut builder: LayerfigBuilder<C>) -> LayerfigBuilder<C> {
        if let Some(prefix) = &self.prefix {
            builder = builder.env_prefix(prefix);
        }

        let Some(source_type) = self.source_type else {
            return match &self.config {
                Some(path) => builder.file(path),
                None => builder,
            };
        };

        match source_type {
            SourceType::Yaml | SourceType::Json | SourceType::Toml => {
                let file_type = match source_type {
                    SourceType::Json => "json",
                    SourceType::Toml => "toml",
                    _ => "yaml",
                };
                builder = builder.file_type(file_type).no_env().disable_fallback();
                if let Some(path) = &self.config {
                    builder = builder.file(path);
                }
                builder
            }
            SourceType::Env => {
                builder.settings_mut().file = None;
                builder.settings_mut().file_type = None;
                builder.use_env().disable_fallback()
            }
            SourceType::DotEnv => {
                let dir = self.config.as_deref().map(env_file_dir);
                let env_file = match dir {
                    Some(dir) => dir.join(".env"),
                    None => PathBuf::from(".env"),
                };
                builder
                    .file(env_file)
                    .file_type("env")
                    .use_env()
                    .enable_fallback()
            }
        }
    }
}

fn env_file_dir(config: &Path) -> PathBuf {
    if config.is_dir() {
        return config.to_path_buf();
    }
    match config.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Layerfig, Settings};
    use crate::fixtures::test::ServerConfig;
    use crate::resolve::ReadPlan;
    use crate::types::Source;
    use clap::Parser;
    use tempfile::TempDir;

    /// Wrapper so we can use `try_parse_from` on the flattened args.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        loader: LoaderArgs,
    }

    fn parse(args: &[&str]) -> LoaderArgs {
        TestCli::try_parse_from(args).unwrap().loader
    }

    fn applied(args: &[&str]) -> Settings {
        let builder = Layerfig::builder::<ServerConfig>()
            .name("app")
            .file_type("yaml")
            .use_env()
            .enable_fallback();
        parse(args).apply(builder).build().settings().clone()
    }

    #[test]
    fn parse_short_flags() {
        let args = parse(&["app", "-c", "conf/app.toml", "-t", "toml", "-p", "MYAPP"]);
        assert_eq!(args.config, Some(PathBuf::from("conf/app.toml")));
        assert_eq!(args.source_type, Some(SourceType::Toml));
        assert_eq!(args.prefix.as_deref(), Some("MYAPP"));
    }

    #[test]
    fn parse_long_flags() {
        let args = parse(&["app", "--config", "a.yaml", "--type", ".env", "--prefix", "X"]);
        assert_eq!(args.source_type, Some(SourceType::DotEnv));
    }

    #[test]
    fn invalid_type_errors() {
        assert!(TestCli::try_parse_from(["app", "--type", "ini"]).is_err());
    }

    #[test]
    fn no_flags_leave_builder_alone() {
        let s = applied(&["app"]);
        assert_eq!(s.name, "app");
        assert_eq!(s.file, None);
        assert!(s.use_env && s.fallback);
    }

    #[test]
    fn config_without_type_sets_file() {
        let s = applied(&["app", "-c", "/etc/app/app.json"]);
        assert_eq!(s.file, Some(PathBuf::from("/etc/app/app.json")));
        assert!(s.fallback);
    }

    #[test]
    fn file_types_are_strict_file_only() {
        let s = applied(&["app", "-t", "json", "-c", "cfg/app.json"]);
        assert_eq!(s.file_type.as_deref(), Some("json"));
        assert_eq!(s.file, Some(PathBuf::from("cfg/app.json")));
        assert!(!s.use_env && !s.fallback);
        assert_eq!(ReadPlan::for_settings(&s).sources(), vec![Source::File]);
    }

    #[test]
    fn env_type_is_strict_env_only() {
        let s = applied(&["app", "-t", "env", "-p", "svc"]);
        assert_eq!(s.env_prefix.as_deref(), Some("svc"));
        assert_eq!(ReadPlan::for_settings(&s).sources(), vec![Source::Env]);
    }

    #[test]
    fn dotenv_type_uses_file_next_to_config() {
        let s = applied(&["app", "-t", ".env", "-c", "deploy/app.yaml"]);
        assert_eq!(s.file, Some(PathBuf::from("deploy/.env")));
        assert_eq!(
            ReadPlan::for_settings(&s).sources(),
            vec![Source::File, Source::DotEnv, Source::Env]
        );
    }

    #[test]
    fn dotenv_type_accepts_directory() {
        let dir = TempDir::new().unwrap();
        let dir_arg = dir.path().to_str().unwrap();
        let s = applied(&["app", "-t", ".env", "-c", dir_arg]);
        assert_eq!(s.file, Some(dir.path().join(".env")));
    }

    #[test]
    fn dotenv_type_defaults_to_cwd() {
        let s = applied(&["app", "-t", ".env"]);
        assert_eq!(s.file, Some(PathBuf::from(".env")));
    }
}
