//! Connection configuration
//!
//! The effective configuration is assembled from layered sources, each one
//! overriding the previous one field by field:
//!
//! 1. built-in defaults (applied last, only for fields nobody set)
//! 2. environment variables (`PGIMPORT_PG_*`)
//! 3. an optional configuration file (JSON or properties)
//! 4. command-line parameters
//!
//! Every source produces a [`PartialConfig`]; [`ConfigResolver`] merges them
//! in order and fills the gaps with defaults to produce an
//! [`EffectiveConfig`].

pub mod env;
pub mod file;
pub mod params;

pub use file::ConfigFileFormat;
pub use params::ConnectionArgs;

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Field name of the host in files and on the command line
pub const KEY_HOST: &str = "pghost";
pub const KEY_PORT: &str = "pgport";
pub const KEY_USER: &str = "pguser";
pub const KEY_PASSWORD: &str = "pgpass";
pub const KEY_DBNAME: &str = "pgdbname";

/// Host used when no source sets one.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when no source sets one.
pub const DEFAULT_PORT: u16 = 5432;

/// A configuration fragment from a single source.
///
/// `None` means the source did not set the field. Empty strings and a port
/// of zero or below are treated as unset when merging.
///
/// The port is kept as a plain integer here; it is only checked against the
/// TCP range once all sources are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialConfig {
    #[serde(rename = "pghost", default)]
    pub host: Option<String>,
    #[serde(rename = "pgport", default)]
    pub port: Option<i64>,
    #[serde(rename = "pguser", default)]
    pub username: Option<String>,
    #[serde(rename = "pgpass", default)]
    pub password: Option<String>,
    #[serde(rename = "pgdbname", default)]
    pub dbname: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl PartialConfig {
    /// Lay `overlay` on top of `self`.
    ///
    /// A field takes the overlay's value when that value is a non-empty
    /// string (or a positive port); otherwise the base value is kept.
    pub fn merge(self, overlay: PartialConfig) -> PartialConfig {
        PartialConfig {
            host: non_empty(overlay.host).or(self.host),
            port: overlay.port.filter(|p| *p > 0).or(self.port),
            username: non_empty(overlay.username).or(self.username),
            password: non_empty(overlay.password).or(self.password),
            dbname: non_empty(overlay.dbname).or(self.dbname),
        }
    }

    /// Names of the fields this fragment would contribute to a merge
    pub fn provided_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.host.as_deref().is_some_and(|v| !v.is_empty()) {
            fields.push(KEY_HOST);
        }
        if self.port.is_some_and(|p| p > 0) {
            fields.push(KEY_PORT);
        }
        if self.username.as_deref().is_some_and(|v| !v.is_empty()) {
            fields.push(KEY_USER);
        }
        if self.password.as_deref().is_some_and(|v| !v.is_empty()) {
            fields.push(KEY_PASSWORD);
        }
        if self.dbname.as_deref().is_some_and(|v| !v.is_empty()) {
            fields.push(KEY_DBNAME);
        }
        fields
    }

    /// Fill every unset field with its default.
    ///
    /// Fails when the port is set but larger than a TCP port allows.
    pub fn resolve(self) -> Result<EffectiveConfig, ConfigError> {
        let port = match self.port.filter(|p| *p > 0) {
            Some(port) => u16::try_from(port).map_err(|_| ConfigError::PortOutOfRange { port })?,
            None => DEFAULT_PORT,
        };

        Ok(EffectiveConfig {
            host: non_empty(self.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            dbname: self.dbname.unwrap_or_default(),
        })
    }
}

/// Fully resolved connection settings consumed by the importer.
#[derive(Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

impl fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("dbname", &self.dbname)
            .finish()
    }
}

impl fmt::Display for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.username, self.host, self.port, self.dbname)
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Merges the configuration sources in precedence order.
///
/// ```no_run
/// use pgimport::config::{ConfigResolver, ConnectionArgs};
///
/// let args = ConnectionArgs::default();
/// let config = ConfigResolver::new().with_parameters(args).resolve()?;
/// println!("connecting to {}", config);
/// # Ok::<(), pgimport::error::ConfigError>(())
/// ```
pub struct ConfigResolver {
    env_lookup: Option<EnvLookup>,
    parameters: Option<ConnectionArgs>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver reading the process environment
    pub fn new() -> Self {
        Self {
            env_lookup: None,
            parameters: None,
        }
    }

    /// Replace the environment with a custom lookup (used by tests)
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.env_lookup = Some(Box::new(lookup));
        self
    }

    /// Supply the command-line parameters. Required before [`resolve`](Self::resolve).
    pub fn with_parameters(mut self, parameters: ConnectionArgs) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Merge environment, then the configuration file (when one was given),
    /// then command-line parameters.
    pub fn resolve(&self) -> Result<EffectiveConfig, ConfigError> {
        let parameters = self
            .parameters
            .as_ref()
            .ok_or(ConfigError::ParametersNotInitialized)?;

        let mut merged = PartialConfig::default();

        let from_env = match self.env_lookup {
            Some(ref lookup) => env::from_lookup(lookup)?,
            None => env::read_environment()?,
        };
        debug!(source = "environment", fields = ?from_env.provided_fields(), "Configuration source read");
        merged = merged.merge(from_env);

        if let Some(ref path) = parameters.conf {
            let from_file = file::read_config_file(path)?;
            debug!(
                source = %path.display(),
                fields = ?from_file.provided_fields(),
                "Configuration source read"
            );
            merged = merged.merge(from_file);
        }

        let from_params = params::read_parameters(Some(parameters))?;
        debug!(source = "command line", fields = ?from_params.provided_fields(), "Configuration source read");
        merged = merged.merge(from_params);

        let effective = merged.resolve()?;

        if effective.username.is_empty() {
            warn!("No PostgreSQL user configured; the server default will be used");
        }
        if effective.dbname.is_empty() {
            warn!("No PostgreSQL database configured; the server default will be used");
        }

        Ok(effective)
    }
}
