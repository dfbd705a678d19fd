use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
const RAISE_EXCEPTION: &str = "P0001";

/// Errors from the relational store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// SQLSTATE reported by Postgres, if any
    pub fn code(&self) -> Option<String> {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => db_err.code().map(|c| c.into_owned()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_) | DatabaseError::Sqlx(sqlx::Error::RowNotFound))
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code().as_deref() == Some(UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    }

    /// Connectivity problems rather than a bad query
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConfigMissing(_)
                | DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
                | DatabaseError::Sqlx(sqlx::Error::PoolClosed)
                | DatabaseError::Sqlx(sqlx::Error::Io(_))
                | DatabaseError::Sqlx(sqlx::Error::Tls(_))
        )
    }

    /// Message of a `RAISE EXCEPTION` from a database function
    pub fn raised_message(&self) -> Option<String> {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(RAISE_EXCEPTION) =>
            {
                Some(db_err.message().to_string())
            }
            _ => None,
        }
    }
}

/// Builds and checks the shared connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    fn options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    fn url(config: &DatabaseConfig) -> Result<&str, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        Ok(url)
    }

    /// Connect eagerly; fails fast when the database is down at startup
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = Self::options(config).connect(Self::url(config)?).await?;
        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Validate table/column names before they are interpolated into SQL
    pub fn is_valid_identifier(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name.starts_with(|c: char| c.is_ascii_lowercase() || c == '_')
            && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_identifiers() {
        assert!(DatabaseManager::is_valid_identifier("brands"));
        assert!(DatabaseManager::is_valid_identifier("user_brand_permissions"));
        assert!(!DatabaseManager::is_valid_identifier("Brands"));
        assert!(!DatabaseManager::is_valid_identifier("brands; DROP TABLE brands"));
        assert!(!DatabaseManager::is_valid_identifier("1brands"));
        assert!(!DatabaseManager::is_valid_identifier(""));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };
        let err = DatabaseManager::url(&config).unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigMissing("DATABASE_URL")));
        assert!(err.is_unavailable());
    }

    #[test]
    fn row_not_found_counts_as_not_found() {
        assert!(DatabaseError::Sqlx(sqlx::Error::RowNotFound).is_not_found());
        assert!(!DatabaseError::InvalidDatabaseUrl.is_not_found());
        assert!(DatabaseError::InvalidDatabaseUrl.code().is_none());
    }
}
