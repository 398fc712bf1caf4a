//! Layered configuration: an optional file overlaid by `WHUB__*` environment variables.

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

pub const ENV_PREFIX: &str = "WHUB";
pub const DEFAULT_FILE: &str = "server";

#[whub_derive::whub_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Builds a configuration tree from a file and the environment.
///
/// The file format follows the extension; a path without one (the default `server`) is probed
/// for `server.toml`, `server.json`, ... Nested keys come from variables such as
/// `WHUB__SERVER__PORT=8080`; `WHUB__SERVER__CORS_ORIGINS` takes a comma-separated list.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    file_required: bool,
    env: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path`, failing when it does not exist.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self.file_required = true;
        self
    }

    /// Reads `path` when present.
    #[must_use]
    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self.file_required = false;
        self
    }

    /// Uses the given variables instead of the process environment.
    #[must_use]
    pub fn env_source<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn load<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            info!(path = %path.display(), required = self.file_required, "Loading configuration");
            builder = builder.add_source(File::from(path.as_path()).required(self.file_required));
        }

        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .source(self.env);

        builder
            .add_source(env)
            .build()
            .context("Building configuration")?
            .try_deserialize::<T>()
            .context("Deserializing configuration")
    }
}

/// Loads `path` (default `server`, optional) plus the process environment.
pub fn load_config<T: DeserializeOwned>(path: Option<&str>) -> Result<T, ConfigError> {
    ConfigLoader::new().optional_file(path.unwrap_or(DEFAULT_FILE)).load()
}
