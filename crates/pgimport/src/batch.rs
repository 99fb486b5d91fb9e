//! Statement batches
//!
//! A batch is read from a text source with one statement per line. Lines
//! are kept verbatim apart from the line terminator; there is no comment
//! stripping and no multi-line statement support.

use crate::error::BatchError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Input path that selects standard input
pub const STDIN_PATH: &str = "-";

/// One statement together with the line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based line number in the source
    pub line: usize,
    pub sql: String,
}

/// Ordered statements read from one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    source: String,
    statements: Vec<Statement>,
}

impl StatementBatch {
    /// Build a batch from in-memory lines
    pub fn new<I, S>(source: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let statements = lines
            .into_iter()
            .enumerate()
            .map(|(i, sql)| Statement {
                line: i + 1,
                sql: sql.into(),
            })
            .collect();

        Self {
            source: source.into(),
            statements,
        }
    }

    /// Read every line of `reader` as one statement.
    pub fn from_reader<R: BufRead>(source: impl Into<String>, reader: R) -> Result<Self, BatchError> {
        let source = source.into();
        let mut lines = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| BatchError::Read {
                source_name: source.clone(),
                source: e,
            })?;
            lines.push(line);
        }

        Ok(Self::new(source, lines))
    }

    /// Open and read a SQL file
    pub fn from_path(path: &Path) -> Result<Self, BatchError> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| BatchError::Read {
            source_name: name.clone(),
            source: e,
        })?;
        Self::from_reader(name, BufReader::new(file))
    }

    /// Read from a file path, or from standard input when the path is `-`
    pub fn from_input(path: &Path) -> Result<Self, BatchError> {
        if path == Path::new(STDIN_PATH) {
            Self::from_reader("<stdin>", std::io::stdin().lock())
        } else {
            Self::from_path(path)
        }
    }

    /// Name of the file or stream the statements were read from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};

    #[test]
    fn test_one_statement_per_line_in_order() {
        let input = "CREATE TABLE t(x int)\nINSERT INTO t VALUES (1)\r\n\nINSERT INTO t VALUES (2)";
        let batch = StatementBatch::from_reader("inline", Cursor::new(input)).unwrap();

        assert_eq!(batch.source(), "inline");
        assert_eq!(batch.len(), 4);

        let sql: Vec<&str> = batch.statements().iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE t(x int)",
                "INSERT INTO t VALUES (1)",
                "",
                "INSERT INTO t VALUES (2)",
            ]
        );
        let lines: Vec<usize> = batch.statements().iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_comments_are_not_stripped() {
        let batch = StatementBatch::from_reader("x", Cursor::new("-- note\nSELECT 1; -- trailing\n")).unwrap();
        assert_eq!(batch.statements()[0].sql, "-- note");
        assert_eq!(batch.statements()[1].sql, "SELECT 1; -- trailing");
    }

    #[test]
    fn test_empty_source_is_empty_batch() {
        let batch = StatementBatch::from_reader("empty", Cursor::new("")).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SELECT 1\nSELECT 2\n").unwrap();

        let batch = StatementBatch::from_path(file.path()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.source(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_names_source() {
        let err = StatementBatch::from_path(Path::new("/nonexistent/batch.sql")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/batch.sql"));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_read_error_is_reported() {
        let err = StatementBatch::from_reader("stdin", BufReader::new(FailingReader)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("stdin"));
        assert!(msg.contains("disk on fire"));
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let err = StatementBatch::from_reader("bin", Cursor::new(vec![0xff, 0xfe, b'\n'])).unwrap_err();
        assert!(matches!(err, BatchError::Read { .. }));
    }
}
