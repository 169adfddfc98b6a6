//! Typed configuration resolved from a config file, a `.env` file or
//! environment variables, with optional live reload.
//!
//! Layerfig resolves a struct from one of several prioritized sources, fills
//! the gaps with the struct's declared defaults, and can keep the result up
//! to date as the backing file changes. Built on
//! [confique](https://docs.rs/confique) for struct-driven defaults.
//!
//! ```ignore
//! let config: AppConfig = Layerfig::builder()
//!     .name("app")
//!     .file_path("/etc/myapp")
//!     .file_type("yaml")
//!     .use_env()
//!     .use_defaults()
//!     .enable_fallback()
//!     .load()?;
//! ```
//!
//! That call looks for `/etc/myapp/app.yaml` (then `./app.yaml`), falls back
//! to environment variables like `HTTP_PORT` if no file is readable, fills in
//! `#[config(default)]` values, and hands you a typed struct.
//!
//! # Struct as schema
//!
//! Your config struct (via confique's `Config` derive) defines every key:
//!
//! - **Field names** are the external names. Nested structs
//!   (`#[config(nested)]`) join names with `.`: `http.port`.
//! - **`#[config(default = ...)]`** is the value used when no source sets
//!   the field and defaults are enabled. It also tells the env reader what
//!   type to parse: a string default keeps `"0123"` as text.
//! - **Scalar types are converted on decode.** Text from env vars becomes the
//!   number or bool a field asks for, and a number becomes text for a
//!   `String` field, so `DB_PASSWORD=123456` loads into `Option<String>`.
//! - **`Option<T>` fields** may be left unset everywhere.
//!
//! [`Loader::bind_keys()`] lists the dotted keys with their defaults and doc
//! comments.
//!
//! # One source per load
//!
//! Sources are not merged. Each load reads exactly one source, chosen by the
//! builder settings:
//!
//! ```text
//! fallback on:   file  →  .env file (if the file is a .env)  →  env vars
//! fallback off:  .env file   if the configured file is a .env
//!                env vars    else if env is enabled
//!                file        otherwise
//! ```
//!
//! With fallback, a source that cannot be read (missing file, parse error)
//! hands over to the next one, and the last failure is returned when none
//! works. Without fallback, the one source must work. Failures to decode the
//! values that were read are never retried.
//!
//! Declared defaults sit under whichever source won. Without
//! [`use_defaults()`](LayerfigBuilder::use_defaults), every non-optional
//! field must come from that source.
//!
//! # Naming
//!
//! The same struct loads whether its fields are declared `snake_case` or
//! `camelCase`, and whatever spelling a source uses. A source key matches a
//! field if the two are equal ignoring case, equal after camel→snake
//! conversion, or equal once underscores are removed.
//!
//! Env var names are derived from the keys:
//!
//! | Key | Snake case (default) | Collapsed | Prefix `app` |
//! |-----|----------------------|-----------|--------------|
//! | `log_level` | `LOG_LEVEL` | `LOGLEVEL` | `APP_LOG_LEVEL` |
//! | `serverConfig.port` | `SERVER_CONFIG_PORT` | `SERVERCONFIGPORT` | `APP_SERVER_CONFIG_PORT` |
//!
//! Choose collapsed names with
//! [`snake_case_env_vars(false)`](LayerfigBuilder::snake_case_env_vars).
//!
//! # `.env` files
//!
//! When the `.env` file is the source, its pairs are loaded into the process
//! environment (variables already set keep their values) and then read like
//! any other env vars. The injected variables stay set after the load.
//!
//! A loader remembers which variables it injected. Later loads through the
//! same loader, live reloads included, read those from the file as it is now,
//! so editing the `.env` file takes effect.
//!
//! # Live reload
//!
//! [`Loader::load_live()`] returns a [`LiveConfig`], a cheaply cloneable
//! handle whose [`get()`](LiveConfig::get) returns an immutable snapshot.
//! [`Loader::enable_live_reload()`] watches the config file and swaps in a
//! fresh snapshot after each change; readers never see a half-updated value.
//! A reload that fails keeps the previous snapshot and is reported as
//! [`ReloadEvent::Failed`]. The session ends on the cancellation token you
//! pass in or on [`Loader::stop_live_reload()`].
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`LoaderArgs`]: `--config`, `--type` and `--prefix` flags applied on top
//! of a builder. To use layerfig without clap:
//!
//! ```toml
//! layerfig = { version = "...", default-features = false }
//! ```
//!
//! # Error handling
//!
//! All fallible operations return [`LayerfigError`]. Read failures are
//! wrapped [`SourceError`]s; see the [`error`] module for the full set.

pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
mod keys;
mod lenient;
mod naming;
mod resolve;
mod store;
mod watch;

#[cfg(test)]
mod fixtures;

pub use builder::{Layerfig, LayerfigBuilder, Loader, Settings};
#[cfg(feature = "clap")]
pub use cli::{LoaderArgs, SourceType};
pub use error::{LayerfigError, SourceError};
pub use keys::BindKey;
pub use naming::NamingConvention;
pub use types::{FileFormat, Source};
pub use watch::{LiveConfig, ReloadEvent, ReloadEvents};
