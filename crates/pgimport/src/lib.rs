//! pgimport library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Applies a file of SQL statements to PostgreSQL as one transaction.
//!
//! # Overview
//!
//! - **Configuration** ([`config`]): connection settings merged from the
//!   environment, an optional JSON or properties file, and command-line
//!   parameters, in that order of increasing precedence
//! - **Batches** ([`batch`]): one opaque statement per input line
//! - **Import** ([`importer`]): all statements committed together, or none
//!
//! # Example
//!
//! ```no_run
//! use pgimport::batch::StatementBatch;
//! use pgimport::config::{ConfigResolver, ConnectionArgs};
//! use std::path::Path;
//!
//! # async fn run() -> pgimport::Result<()> {
//! let config = ConfigResolver::new()
//!     .with_parameters(ConnectionArgs::default())
//!     .resolve()?;
//! let batch = StatementBatch::from_path(Path::new("readings.sql"))?;
//! let report = pgimport::importer::import(&batch, &config).await?;
//! println!("{} statements applied", report.statements_applied);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod importer;

// Re-export commonly used types
pub use error::{PgImportError, Result};

use clap::Parser;
use config::ConnectionArgs;
use std::path::PathBuf;

/// pgimport - apply a SQL file to PostgreSQL in a single transaction
#[derive(Parser, Debug)]
#[command(name = "pgimport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQL file with one statement per line (`-` reads standard input)
    #[arg(value_name = "INFILE", required_unless_present = "markdown_help")]
    pub infile: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Resolve the configuration and read the batch without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the command reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}
