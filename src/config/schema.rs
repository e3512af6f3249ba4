//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! Values are populated by the loader from environment variables.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Port the HTTP listener binds to.
pub const DEFAULT_PORT: u16 = 80;

/// How long to wait for a database connection before giving up.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Root configuration for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deployment environment tag.
    pub environment: AppEnvironment,

    /// Database connection parameters.
    pub database: DatabaseConfig,

    /// Listener configuration.
    pub listener: ListenerConfig,
}

/// Deployment environment the service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEnvironment {
    Development,
    Staging,
    Production,
}

impl AppEnvironment {
    /// All accepted environment tags.
    pub const ALL: [AppEnvironment; 3] = [
        AppEnvironment::Development,
        AppEnvironment::Staging,
        AppEnvironment::Production,
    ];

    /// The tag as it appears in `APP_ENVIRONMENT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Staging => "staging",
            AppEnvironment::Production => "production",
        }
    }

    /// Append the environment suffix to a database name or user.
    pub fn scoped(&self, base: &str) -> String {
        format!("{}_{}", base, self.as_str())
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PostgreSQL connection parameters.
///
/// `name` and `user` already carry the environment suffix.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Value for the `sslmode` connection parameter.
    pub ssl_mode: Option<String>,
    /// Path to the root certificate (`sslrootcert`).
    pub ssl_root_cert: Option<String>,
    /// Pool acquire timeout, bounding the startup connection attempt.
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Build the `postgres://` connection string.
    pub fn connection_string(&self) -> String {
        self.render(&self.password)
    }

    /// Connection string with the password masked, for logs.
    pub fn redacted_connection_string(&self) -> String {
        self.render("****")
    }

    fn render(&self, password: &str) -> String {
        let mut url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, password, self.host, self.port, self.name
        );

        let mut separator = '?';
        if let Some(mode) = &self.ssl_mode {
            url.push(separator);
            url.push_str("sslmode=");
            url.push_str(mode);
            separator = '&';
        }
        if let Some(cert) = &self.ssl_root_cert {
            url.push(separator);
            url.push_str("sslrootcert=");
            url.push_str(cert);
        }
        url
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"****")
            .field("ssl_mode", &self.ssl_mode)
            .field("ssl_root_cert", &self.ssl_root_cert)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:80").
    pub bind_address: SocketAddr,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}
