use super::ImportTarget;
use crate::config::EffectiveConfig;
use crate::error::ImportError;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{ConnectOptions, Connection, Executor};
use tracing::debug;

/// Build connection options from the effective configuration.
///
/// Empty user, password or database name are left to the driver defaults.
pub fn connect_options(config: &EffectiveConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .ssl_mode(PgSslMode::Disable)
        .application_name("pgimport");

    if !config.username.is_empty() {
        options = options.username(&config.username);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.dbname.is_empty() {
        options = options.database(&config.dbname);
    }

    options
}

/// A single PostgreSQL session.
///
/// Statements are sent as plain strings without bind arguments, which sqlx
/// runs over the simple query protocol, so each line of the batch reaches
/// the server exactly as written.
pub struct PgTarget {
    conn: PgConnection,
    endpoint: String,
}

impl PgTarget {
    pub async fn connect(config: &EffectiveConfig) -> Result<Self, ImportError> {
        let endpoint = config.to_string();
        debug!(endpoint = %endpoint, "Connecting to PostgreSQL");

        let conn = connect_options(config)
            .connect()
            .await
            .map_err(|source| ImportError::Connection {
                target: endpoint.clone(),
                source,
            })?;

        Ok(Self { conn, endpoint })
    }
}

#[async_trait]
impl ImportTarget for PgTarget {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        self.conn.ping().await
    }

    async fn begin(&mut self) -> Result<(), sqlx::Error> {
        self.conn.execute("BEGIN").await.map(|_| ())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), sqlx::Error> {
        self.conn.execute(sql).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        self.conn.execute("ROLLBACK").await.map(|_| ())
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        self.conn.execute("COMMIT").await.map(|_| ())
    }

    async fn close(self) -> Result<(), sqlx::Error> {
        self.conn.close().await
    }
}
