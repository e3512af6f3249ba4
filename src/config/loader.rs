//! Configuration loading from the environment.

use std::path::{Path, PathBuf};

use crate::config::schema::{
    AppEnvironment, DatabaseConfig, ListenerConfig, ServiceConfig, DEFAULT_CONNECT_TIMEOUT,
};
use crate::config::validation::{self, ValidationError};

pub const APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASS: &str = "DB_PASS";
pub const DB_SSLM: &str = "DB_SSLM";
pub const DB_CERT: &str = "DB_CERT";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Load variables from a `.env` file into the process environment.
///
/// Variables already set in the environment win. With no explicit path a
/// missing `.env` is not an error; an explicit path must exist.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            }),
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.not_found() => {
                tracing::debug!("No .env file found, using process environment");
                Ok(None)
            }
            Err(source) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}

impl ServiceConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment: AppEnvironment =
            validation::required(APP_ENVIRONMENT, lookup(APP_ENVIRONMENT))?.parse()?;

        let host = validation::required(DB_HOST, lookup(DB_HOST))?;
        let port = validation::port(DB_PORT, validation::required(DB_PORT, lookup(DB_PORT))?)?;
        let name = validation::required(DB_NAME, lookup(DB_NAME))?;
        let user = validation::required(DB_USER, lookup(DB_USER))?;

        let database = DatabaseConfig {
            host,
            port,
            name: environment.scoped(&name),
            user: environment.scoped(&user),
            password: lookup(DB_PASS).unwrap_or_default(),
            ssl_mode: validation::optional(lookup(DB_SSLM)),
            ssl_root_cert: validation::optional(lookup(DB_CERT)),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        };

        Ok(Self {
            environment,
            database,
            listener: ListenerConfig::default(),
        })
    }
}
