//! Command-line parameter source

use super::PartialConfig;
use crate::error::ConfigError;
use clap::Args;
use std::path::PathBuf;

/// Connection options accepted on the command line.
///
/// Options the user does not pass stay unset so they cannot shadow values
/// from the environment or the configuration file; the defaults are applied
/// only after all sources are merged.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Configuration file (.json, .properties, .props or .ini)
    #[arg(short = 'c', long = "conf", value_name = "PATH")]
    pub conf: Option<PathBuf>,

    /// PostgreSQL server host [default: localhost]
    #[arg(long, value_name = "HOST")]
    pub pghost: Option<String>,

    /// PostgreSQL server port [default: 5432]
    #[arg(long, value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    pub pgport: Option<u16>,

    /// PostgreSQL login user name
    #[arg(long, value_name = "USER")]
    pub pguser: Option<String>,

    /// PostgreSQL login password
    #[arg(long, value_name = "PASSWORD")]
    pub pgpass: Option<String>,

    /// PostgreSQL database name
    #[arg(long, value_name = "NAME")]
    pub pgdbname: Option<String>,
}

/// Turn the parsed parameters into a configuration fragment.
///
/// Fails when the parameters were never parsed.
pub fn read_parameters(parameters: Option<&ConnectionArgs>) -> Result<PartialConfig, ConfigError> {
    let args = parameters.ok_or(ConfigError::ParametersNotInitialized)?;

    Ok(PartialConfig {
        host: args.pghost.clone(),
        port: args.pgport.map(i64::from),
        username: args.pguser.clone(),
        password: args.pgpass.clone(),
        dbname: args.pgdbname.clone(),
    })
}
