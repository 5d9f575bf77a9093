//! PostgreSQL connection pool.

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Pool settings, deserialized straight from the `[database]` section of the
/// application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

/// Open a pool sized and timed per the configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_settings_default_when_only_url_is_given() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgres://localhost/fleet_presence"
        }))
        .unwrap();

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_pool_settings_can_be_overridden() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgres://localhost/fleet_presence",
            "max_connections": 4,
            "idle_timeout_secs": 30
        }))
        .unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.idle_timeout_secs, 30);
    }
}
