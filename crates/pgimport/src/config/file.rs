//! Configuration file source
//!
//! Two formats are accepted, picked once from the file extension:
//!
//! - JSON (`.json`): an object with the keys `pghost`, `pgport`, `pguser`,
//!   `pgpass`, `pgdbname`
//! - properties (`.properties`, `.props`, `.ini`): one `key=value` per line
//!   with the same keys

use super::{PartialConfig, KEY_DBNAME, KEY_HOST, KEY_PASSWORD, KEY_PORT, KEY_USER};
use crate::error::ConfigError;
use std::path::Path;

/// Format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileFormat {
    Json,
    Properties,
}

impl ConfigFileFormat {
    /// Select the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(ConfigFileFormat::Json),
            Some("properties") | Some("props") | Some("ini") => Ok(ConfigFileFormat::Properties),
            _ => Err(ConfigError::UnsupportedFile {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse file contents in this format. `path` is only used in errors.
    pub fn parse(self, path: &Path, content: &str) -> Result<PartialConfig, ConfigError> {
        match self {
            ConfigFileFormat::Json => {
                serde_json::from_str(content).map_err(|source| ConfigError::FileParse {
                    path: path.to_path_buf(),
                    source,
                })
            },
            ConfigFileFormat::Properties => parse_properties(path, content),
        }
    }
}

/// Read a configuration file, dispatching on its extension.
pub fn read_config_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let format = ConfigFileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(path, &content)
}

fn parse_properties(path: &Path, content: &str) -> Result<PartialConfig, ConfigError> {
    let mut config = PartialConfig::default();

    for (line_no, line) in content.lines().enumerate() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().to_string();

        match key {
            KEY_HOST => config.host = Some(value),
            KEY_PORT if value.is_empty() => config.port = None,
            KEY_PORT => {
                let port = value.parse::<i64>().map_err(|_| {
                    ConfigError::invalid_port(
                        format!("{} line {}", path.display(), line_no + 1),
                        value.as_str(),
                    )
                })?;
                config.port = Some(port);
            },
            KEY_USER => config.username = Some(value),
            KEY_PASSWORD => config.password = Some(value),
            KEY_DBNAME => config.dbname = Some(value),
            _ => {},
        }
    }

    Ok(config)
}
