//! Test utilities for pgimport integration tests using testcontainers
//!
//! Each test gets its own PostgreSQL container, so imports never see state
//! left behind by another test.
//!
//! These helpers require a running Docker daemon; tests using them are
//! marked `#[ignore = "requires Docker"]`:
//!
//! ```bash
//! cargo test -p pgimport --test import_tests -- --ignored --nocapture
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use pgimport::config::EffectiveConfig;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

/// PostgreSQL test container wrapper
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    config: EffectiveConfig,
}

impl TestPostgres {
    /// Start a fresh PostgreSQL container
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let config = EffectiveConfig {
            host: host.to_string(),
            port,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "postgres".to_string(),
        };

        Ok(Self {
            _container: container,
            config,
        })
    }

    /// Configuration pointing at the container
    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    /// Open a separate session for checking what an import left behind
    pub async fn connect(&self) -> Result<PgConnection> {
        PgConnection::connect_with(&pgimport::importer::connect_options(&self.config))
            .await
            .context("Failed to connect to PostgreSQL")
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let exists = sqlx::query_scalar::<_, bool>("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(&mut conn)
            .await
            .context("Failed to check table existence")?;
        conn.close().await.ok();
        Ok(exists)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let mut conn = self.connect().await?;
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&mut conn)
            .await
            .context("Failed to count rows")?;
        conn.close().await.ok();
        Ok(count)
    }
}

/// Initialize tracing for tests
///
/// Call at the start of a test to see logs. Safe to call more than once.
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,pgimport=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}
