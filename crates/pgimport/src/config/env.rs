//! Environment variable source

use super::PartialConfig;
use crate::error::ConfigError;

pub const ENV_HOST: &str = "PGIMPORT_PG_HOST";
pub const ENV_PORT: &str = "PGIMPORT_PG_PORT";
pub const ENV_USER: &str = "PGIMPORT_PG_USER";
pub const ENV_PASSWORD: &str = "PGIMPORT_PG_PASS";
pub const ENV_DBNAME: &str = "PGIMPORT_PG_DBNAME";

/// Read the `PGIMPORT_PG_*` variables from the process environment.
pub fn read_environment() -> Result<PartialConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a fragment from an arbitrary variable lookup.
///
/// Variables that are absent leave their field unset. A port variable that
/// is present must parse as an integer; zero or negative values are read
/// and later ignored by the merge.
pub fn from_lookup<F>(lookup: F) -> Result<PartialConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let port = match lookup(ENV_PORT) {
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::invalid_port(format!("environment variable {}", ENV_PORT), raw))?,
        ),
        None => None,
    };

    Ok(PartialConfig {
        host: lookup(ENV_HOST),
        port,
        username: lookup(ENV_USER),
        password: lookup(ENV_PASSWORD),
        dbname: lookup(ENV_DBNAME),
    })
}
