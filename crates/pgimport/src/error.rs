//! Error types for pgimport
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! configuration problem from a failed import without string matching.
//! Messages carry enough context (source, path, statement position) to
//! diagnose a failure without re-running.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pgimport operations
pub type Result<T> = std::result::Result<T, PgImportError>;

/// A configuration source could not be read or parsed.
///
/// Always fatal to configuration resolution; there is no fallback to another
/// source.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A port value is not an integer
    #[error("Invalid port '{value}' in {source_name}. Expected an integer.")]
    InvalidPort { source_name: String, value: String },

    /// The merged port does not fit a TCP port
    #[error("Port {port} is out of range. Expected a number between 1 and 65535.")]
    PortOutOfRange { port: i64 },

    /// The configuration file could not be opened or read
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON configuration file is malformed
    #[error("Failed to parse configuration file '{}': {source}. Check the file syntax.", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file extension does not select a known format
    #[error("Unrecognized configuration file '{}'. Use a .json, .properties, .props or .ini file.", path.display())]
    UnsupportedFile { path: PathBuf },

    /// Resolution was attempted before the command-line parameters were supplied
    #[error("Command-line parameters were not initialized before resolving configuration")]
    ParametersNotInitialized,
}

impl ConfigError {
    /// Create an invalid port error
    pub fn invalid_port(source_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidPort {
            source_name: source_name.into(),
            value: value.into(),
        }
    }
}

/// The statement batch could not be read
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read SQL statements from '{source_name}': {source}")]
    Read {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// How much of an import may have reached the database when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSeverity {
    /// No effect of the batch is visible in the database
    NothingApplied,
    /// Rollback failed after a statement error; database state is unknown
    Indeterminate,
    /// Every statement ran but the commit failed; verify manually
    NotPersisted,
}

/// The transactional import failed
#[derive(Error, Debug)]
pub enum ImportError {
    /// Connecting or the liveness check failed
    #[error("Failed to connect to PostgreSQL at {target}: {source}. Check the host, port and credentials.")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to begin transaction: {source}")]
    TransactionBegin {
        #[source]
        source: sqlx::Error,
    },

    /// A statement failed and the transaction was rolled back
    #[error("Statement {index} (line {line}) failed and the import was rolled back: {source}\n  SQL: {statement}")]
    Statement {
        index: usize,
        line: usize,
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    /// A statement failed and rolling back failed as well
    #[error("Statement {index} (line {line}) failed: {statement_error}. Additionally the rollback failed: {rollback_error}. Database state is indeterminate.\n  SQL: {statement}")]
    Rollback {
        index: usize,
        line: usize,
        statement: String,
        #[source]
        statement_error: sqlx::Error,
        rollback_error: sqlx::Error,
    },

    /// All statements ran in the session but the commit did not succeed
    #[error("Commit failed after {applied} statements were applied in the session: {source}. The import may not be persisted; verify the database manually.")]
    Commit {
        applied: usize,
        #[source]
        source: sqlx::Error,
    },
}

impl ImportError {
    pub fn severity(&self) -> FailureSeverity {
        match self {
            ImportError::Connection { .. }
            | ImportError::TransactionBegin { .. }
            | ImportError::Statement { .. } => FailureSeverity::NothingApplied,
            ImportError::Rollback { .. } => FailureSeverity::Indeterminate,
            ImportError::Commit { .. } => FailureSeverity::NotPersisted,
        }
    }

    /// Zero-based position of the failing statement, if a statement failed
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            ImportError::Statement { index, .. } | ImportError::Rollback { index, .. } => {
                Some(*index)
            },
            _ => None,
        }
    }
}

/// Top-level error for the pgimport pipeline
#[derive(Error, Debug)]
pub enum PgImportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
}

impl PgImportError {
    /// Process exit code for this failure
    ///
    /// - 1: configuration or input could not be read
    /// - 3: import failed and nothing was applied
    /// - 4: database state needs manual verification
    ///
    /// 2 is left to clap for usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            PgImportError::Config(_) | PgImportError::Batch(_) => 1,
            PgImportError::Import(e) => match e.severity() {
                FailureSeverity::NothingApplied => 3,
                FailureSeverity::Indeterminate | FailureSeverity::NotPersisted => 4,
            },
        }
    }
}
