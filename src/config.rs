//! Configuration loading
//!
//! Loads connection settings and database capabilities from environment
//! variables, optionally reading from a .env file first.

use std::{env, path::Path};

use tracing::{debug, error, trace, warn};

use crate::prelude::{DatabaseProfile, SnapshotError};

const DEFAULT_CONTAINER_DEPTH: usize = 2;
const DEFAULT_SHORT_NAME: &str = "postgresql";

/// Database connection and capability configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    /// Addressable container levels above a table
    pub container_depth: usize,
    /// Name used for the database in error messages
    pub short_name: String,
}

impl DbConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - DB_HOST (default: localhost)
    /// - DB_PORT (default: 5432)
    /// - DB_NAME (required)
    /// - DB_USER (required)
    /// - DB_PASSWORD (required)
    /// - DB_CONTAINER_DEPTH (default: 2)
    /// - DB_SHORT_NAME (default: postgresql)
    pub fn from_env() -> Result<Self, SnapshotError> {
        debug!("Loading database configuration from environment");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SnapshotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str, default: &str| {
            lookup(key).unwrap_or_else(|| {
                trace!(key, default, "Variable not set, using default");
                default.to_string()
            })
        };
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                error!(key, "Required environment variable is not set");
                SnapshotError::Config(format!("{} environment variable is required", key))
            })
        };

        let host = optional("DB_HOST", "localhost");

        let port_str = optional("DB_PORT", "5432");
        let port = port_str.parse::<u16>().map_err(|e| {
            error!(port = ?port_str, error = ?e, "Invalid DB_PORT value");
            SnapshotError::Config("DB_PORT must be a valid port number".to_string())
        })?;

        let depth_str = optional("DB_CONTAINER_DEPTH", &DEFAULT_CONTAINER_DEPTH.to_string());
        let container_depth = depth_str.parse::<usize>().map_err(|e| {
            error!(depth = ?depth_str, error = ?e, "Invalid DB_CONTAINER_DEPTH value");
            SnapshotError::Config(
                "DB_CONTAINER_DEPTH must be a non-negative integer".to_string(),
            )
        })?;

        let short_name = optional("DB_SHORT_NAME", DEFAULT_SHORT_NAME);

        let database = required("DB_NAME")?;
        let user = required("DB_USER")?;
        let password = required("DB_PASSWORD")?;

        debug!(
            host = ?host,
            port = ?port,
            database = ?database,
            user = ?user,
            container_depth = ?container_depth,
            "Configuration loaded"
        );

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
            container_depth,
            short_name,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path) -> Result<Self, SnapshotError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                SnapshotError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env()
    }

    /// Capabilities of the configured database
    pub fn profile(&self) -> DatabaseProfile {
        DatabaseProfile::new(self.short_name.clone(), self.container_depth)
    }

    /// Check the capability settings against what PostgreSQL exposes
    ///
    /// PostgreSQL addresses tables as database + schema, so the metadata
    /// executor needs both container levels.
    pub fn ensure_postgres_compatible(&self) -> Result<(), SnapshotError> {
        if self.container_depth != DEFAULT_CONTAINER_DEPTH {
            error!(
                container_depth = self.container_depth,
                "PostgreSQL requires two container levels"
            );
            return Err(SnapshotError::Config(format!(
                "DB_CONTAINER_DEPTH must be {} for PostgreSQL, got {}",
                DEFAULT_CONTAINER_DEPTH, self.container_depth
            )));
        }
        Ok(())
    }

    /// Build a PostgreSQL connection string
    pub fn postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }

    /// Build a connection string with password redacted (for error messages)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password=***",
            self.host, self.port, self.database, self.user
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Database;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DB_NAME", "testdb"),
        ("DB_USER", "testuser"),
        ("DB_PASSWORD", "testpass"),
    ];

    #[test]
    fn test_from_lookup_with_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "testdb");
        assert_eq!(config.user, "testuser");
        assert_eq!(config.password, "testpass");
        assert_eq!(config.container_depth, 2);
        assert_eq!(config.short_name, "postgresql");
    }

    #[test]
    fn test_from_lookup_with_capability_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DB_CONTAINER_DEPTH", "1"));
        vars.push(("DB_SHORT_NAME", "mysql"));
        let config = DbConfig::from_lookup(lookup_from(&vars)).unwrap();

        let profile = config.profile();
        assert_eq!(profile.max_snapshot_container_depth(), 1);
        assert_eq!(profile.short_name(), "mysql");
    }

    #[test]
    fn test_from_lookup_missing_db_name() {
        let result = DbConfig::from_lookup(lookup_from(&[
            ("DB_USER", "testuser"),
            ("DB_PASSWORD", "testpass"),
        ]));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("DB_NAME"));
    }

    #[test]
    fn test_from_lookup_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DB_PORT", "not_a_number"));
        let err = DbConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_from_lookup_negative_depth() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DB_CONTAINER_DEPTH", "-1"));
        let err = DbConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("DB_CONTAINER_DEPTH"));
    }

    #[test]
    fn test_postgres_requires_two_levels() {
        let config = DbConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert!(config.ensure_postgres_compatible().is_ok());

        let mut vars = REQUIRED.to_vec();
        vars.push(("DB_CONTAINER_DEPTH", "1"));
        let config = DbConfig::from_lookup(lookup_from(&vars)).unwrap();
        let err = config.ensure_postgres_compatible().unwrap_err();
        assert!(matches!(err, SnapshotError::Config(_)));
        assert!(err.to_string().contains("DB_CONTAINER_DEPTH"));
    }

    #[test]
    fn test_redacted_connection_string() {
        let config = DbConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();

        let conn_str = config.redacted_connection_string();

        assert!(!conn_str.contains("testpass"));
        assert!(conn_str.contains("***"));
        assert!(config.postgres_connection_string().contains("password=testpass"));
    }
}
