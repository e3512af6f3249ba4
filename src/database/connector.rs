//! PostgreSQL connection pool setup.
//!
//! # Responsibilities
//! - Turn `DatabaseConfig` into connect options
//! - Open the pool and verify reachability with a ping
//! - Run the `SELECT version()` diagnostic

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Connection;

use crate::config::DatabaseConfig;

/// Maximum number of pooled connections.
pub const MAX_CONNECTIONS: u32 = 5;

/// Error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[source] sqlx::Error),

    #[error("failed to create connection pool: {0}")]
    Pool(#[source] sqlx::Error),

    #[error("failed to reach database: {0}")]
    Ping(#[source] sqlx::Error),

    #[error("failed to query server version: {0}")]
    Version(#[source] sqlx::Error),
}

/// Handle to the PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and ping the server.
    ///
    /// Waits at most `config.connect_timeout` for the first connection.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = connect_options(config)?;

        tracing::debug!(
            url = %config.redacted_connection_string(),
            max_connections = MAX_CONNECTIONS,
            "Creating connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(DatabaseError::Pool)?;

        let database = Self { pool };
        if let Err(e) = database.ping().await {
            database.close().await;
            return Err(e);
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            "Connected to database"
        );
        Ok(database)
    }

    /// Round-trip check on a pooled connection.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::Ping)?;
        conn.ping().await.map_err(DatabaseError::Ping)
    }

    /// Server version string, e.g. `PostgreSQL 16.2 on x86_64-pc-linux-gnu ...`.
    pub async fn server_version(&self) -> Result<String, DatabaseError> {
        sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Version)
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection. Waits for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection pool closed");
    }
}

#[cfg(test)]
impl Database {
    /// Pool that opens connections on first use, for tests without a server.
    pub(crate) fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(connect_options(config)?);
        Ok(Self { pool })
    }
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
    PgConnectOptions::from_str(&config.connection_string())
        .map_err(DatabaseError::InvalidConnectionString)
}
