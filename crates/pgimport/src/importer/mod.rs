//! Transactional import of a statement batch
//!
//! The whole batch is applied inside one transaction: either every
//! statement is committed or none of them is visible. The first failing
//! statement stops the import and the transaction is rolled back.
//!
//! Two outcomes fall outside that guarantee and get their own error kinds:
//! a rollback that itself fails ([`ImportError::Rollback`]) and a commit that
//! fails after every statement ran ([`ImportError::Commit`]).

mod postgres;

pub use postgres::{connect_options, PgTarget};

use crate::batch::StatementBatch;
use crate::config::EffectiveConfig;
use crate::error::ImportError;
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

/// A database session the importer can drive.
///
/// Transaction control is explicit so the importer decides when to roll
/// back and when to commit.
#[async_trait]
pub trait ImportTarget: Send {
    /// Human-readable description of where the session is connected
    fn endpoint(&self) -> String;

    /// Check that the session is alive
    async fn ping(&mut self) -> Result<(), sqlx::Error>;

    async fn begin(&mut self) -> Result<(), sqlx::Error>;

    /// Run one opaque statement inside the open transaction
    async fn execute(&mut self, sql: &str) -> Result<(), sqlx::Error>;

    async fn rollback(&mut self) -> Result<(), sqlx::Error>;

    async fn commit(&mut self) -> Result<(), sqlx::Error>;

    /// Close the session
    async fn close(self) -> Result<(), sqlx::Error>;
}

/// Successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Name of the batch source
    pub source: String,
    /// Number of statements committed; equals the batch length
    pub statements_applied: usize,
}

/// Connect to PostgreSQL with `config` and apply `batch` in one transaction.
pub async fn import(
    batch: &StatementBatch,
    config: &EffectiveConfig,
) -> Result<ImportReport, ImportError> {
    let target = PgTarget::connect(config).await?;
    import_into(target, batch).await
}

/// Apply `batch` through an already opened session.
///
/// The session is closed before returning, whatever the outcome. A failure
/// to close is logged and does not change the result.
#[instrument(skip_all, fields(source = %batch.source(), statements = batch.len()))]
pub async fn import_into<T: ImportTarget>(
    mut target: T,
    batch: &StatementBatch,
) -> Result<ImportReport, ImportError> {
    let outcome = apply(&mut target, batch).await;

    let endpoint = target.endpoint();
    if let Err(e) = target.close().await {
        warn!(endpoint = %endpoint, error = %e, "Failed to close database connection");
    }

    outcome
}

async fn apply<T: ImportTarget>(
    target: &mut T,
    batch: &StatementBatch,
) -> Result<ImportReport, ImportError> {
    if let Err(source) = target.ping().await {
        return Err(ImportError::Connection {
            target: target.endpoint(),
            source,
        });
    }

    target
        .begin()
        .await
        .map_err(|source| ImportError::TransactionBegin { source })?;

    for (index, statement) in batch.statements().iter().enumerate() {
        debug!(index, line = statement.line, "Executing statement");

        let Err(statement_error) = target.execute(&statement.sql).await else {
            continue;
        };

        warn!(
            index,
            line = statement.line,
            error = %statement_error,
            "Statement failed, rolling back"
        );

        return Err(match target.rollback().await {
            Ok(()) => ImportError::Statement {
                index,
                line: statement.line,
                statement: statement.sql.clone(),
                source: statement_error,
            },
            Err(rollback_error) => ImportError::Rollback {
                index,
                line: statement.line,
                statement: statement.sql.clone(),
                statement_error,
                rollback_error,
            },
        });
    }

    target.commit().await.map_err(|source| ImportError::Commit {
        applied: batch.len(),
        source,
    })?;

    info!(applied = batch.len(), "Batch committed");

    Ok(ImportReport {
        source: batch.source().to_string(),
        statements_applied: batch.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::FailureSeverity;
    use std::sync::{Arc, Mutex};

    /// Scripted session recording every call it receives
    #[derive(Default)]
    struct FakeTarget {
        calls: Arc<Mutex<Vec<String>>>,
        fail_ping: bool,
        fail_begin: bool,
        fail_on_sql: Option<&'static str>,
        fail_rollback: bool,
        fail_commit: bool,
        fail_close: bool,
    }

    impl FakeTarget {
        fn calls(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.calls)
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    fn fail(what: &str) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::Protocol(format!("{} failed", what)))
    }

    #[async_trait]
    impl ImportTarget for FakeTarget {
        fn endpoint(&self) -> String {
            "fake:5432".to_string()
        }

        async fn ping(&mut self) -> Result<(), sqlx::Error> {
            self.record("ping");
            if self.fail_ping {
                return fail("ping");
            }
            Ok(())
        }

        async fn begin(&mut self) -> Result<(), sqlx::Error> {
            self.record("begin");
            if self.fail_begin {
                return fail("begin");
            }
            Ok(())
        }

        async fn execute(&mut self, sql: &str) -> Result<(), sqlx::Error> {
            self.record(format!("exec:{}", sql));
            if self.fail_on_sql == Some(sql) {
                return fail(sql);
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), sqlx::Error> {
            self.record("rollback");
            if self.fail_rollback {
                return fail("rollback");
            }
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), sqlx::Error> {
            self.record("commit");
            if self.fail_commit {
                return fail("commit");
            }
            Ok(())
        }

        async fn close(self) -> Result<(), sqlx::Error> {
            self.record("close");
            if self.fail_close {
                return fail("close");
            }
            Ok(())
        }
    }

    fn scenario_batch() -> StatementBatch {
        StatementBatch::new(
            "scenario.sql",
            [
                "CREATE TABLE t(x int)",
                "INSERT INTO t VALUES (1)",
                "INSERT INTO bogus_table VALUES (1)",
            ],
        )
    }

    fn recorded(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_all_statements_committed() {
        let target = FakeTarget::default();
        let calls = target.calls();
        let batch = StatementBatch::new("ok.sql", ["SELECT 1", "SELECT 2"]);

        let report = import_into(target, &batch).await.unwrap();

        assert_eq!(report.statements_applied, 2);
        assert_eq!(report.source, "ok.sql");
        assert_eq!(
            recorded(&calls),
            vec!["ping", "begin", "exec:SELECT 1", "exec:SELECT 2", "commit", "close"]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_begins_and_commits() {
        let target = FakeTarget::default();
        let calls = target.calls();

        let report = import_into(target, &StatementBatch::new("empty", Vec::<String>::new()))
            .await
            .unwrap();

        assert_eq!(report.statements_applied, 0);
        assert_eq!(recorded(&calls), vec!["ping", "begin", "commit", "close"]);
    }

    #[tokio::test]
    async fn test_failing_statement_rolls_back_and_stops() {
        let target = FakeTarget {
            fail_on_sql: Some("INSERT INTO t VALUES (1)"),
            ..Default::default()
        };
        let calls = target.calls();
        let batch = StatementBatch::new(
            "stop.sql",
            ["SELECT 1", "INSERT INTO t VALUES (1)", "SELECT 3"],
        );

        let err = import_into(target, &batch).await.unwrap_err();

        match err {
            ImportError::Statement {
                index,
                line,
                ref statement,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(line, 2);
                assert_eq!(statement, "INSERT INTO t VALUES (1)");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            recorded(&calls),
            vec![
                "ping",
                "begin",
                "exec:SELECT 1",
                "exec:INSERT INTO t VALUES (1)",
                "rollback",
                "close"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_at_last_statement_reports_index_two() {
        let target = FakeTarget {
            fail_on_sql: Some("INSERT INTO bogus_table VALUES (1)"),
            ..Default::default()
        };

        let err = import_into(target, &scenario_batch()).await.unwrap_err();

        assert_eq!(err.statement_index(), Some(2));
        assert_eq!(err.severity(), FailureSeverity::NothingApplied);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_compound() {
        let target = FakeTarget {
            fail_on_sql: Some("INSERT INTO bogus_table VALUES (1)"),
            fail_rollback: true,
            ..Default::default()
        };
        let calls = target.calls();

        let err = import_into(target, &scenario_batch()).await.unwrap_err();

        assert!(matches!(err, ImportError::Rollback { index: 2, .. }));
        assert_eq!(err.severity(), FailureSeverity::Indeterminate);
        let msg = err.to_string();
        assert!(msg.contains("INSERT INTO bogus_table VALUES (1) failed"));
        assert!(msg.contains("rollback failed"));
        assert_eq!(recorded(&calls).last().map(String::as_str), Some("close"));
    }

    #[tokio::test]
    async fn test_commit_failure_is_distinct() {
        let target = FakeTarget {
            fail_commit: true,
            ..Default::default()
        };
        let batch = StatementBatch::new("c.sql", ["SELECT 1", "SELECT 2", "SELECT 3"]);

        let err = import_into(target, &batch).await.unwrap_err();

        assert!(matches!(err, ImportError::Commit { applied: 3, .. }));
        assert_eq!(err.severity(), FailureSeverity::NotPersisted);
    }

    #[tokio::test]
    async fn test_ping_failure_applies_nothing() {
        let target = FakeTarget {
            fail_ping: true,
            ..Default::default()
        };
        let calls = target.calls();

        let err = import_into(target, &scenario_batch()).await.unwrap_err();

        assert!(matches!(err, ImportError::Connection { .. }));
        assert!(err.to_string().contains("fake:5432"));
        assert_eq!(recorded(&calls), vec!["ping", "close"]);
    }

    #[tokio::test]
    async fn test_begin_failure_applies_nothing() {
        let target = FakeTarget {
            fail_begin: true,
            ..Default::default()
        };
        let calls = target.calls();

        let err = import_into(target, &scenario_batch()).await.unwrap_err();

        assert!(matches!(err, ImportError::TransactionBegin { .. }));
        assert_eq!(recorded(&calls), vec!["ping", "begin", "close"]);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_change_verdict() {
        let target = FakeTarget {
            fail_close: true,
            ..Default::default()
        };
        let batch = StatementBatch::new("ok.sql", ["SELECT 1"]);

        let report = import_into(target, &batch).await.unwrap();
        assert_eq!(report.statements_applied, 1);
    }
}
