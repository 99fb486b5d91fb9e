//! pgimport common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared setup used by the pgimport binaries.
//!
//! - **Logging**: tracing subscriber configuration driven by a builder or by
//!   `LOG_*` environment variables
//!
//! # Example
//!
//! ```no_run
//! use pgimport_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
