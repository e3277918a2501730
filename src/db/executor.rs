//! Guarded statement execution.
//!
//! Every statement goes through the same pipeline:
//! 1. (unless the category is `None` or the check is disabled) `EXPLAIN` the
//!    query and compare the planner's `select_type` with the declared category
//! 2. run the query
//! 3. hand back rows (query mode) or an outcome string (mutation mode)
//!
//! The check and the execution are separate round-trips with no transaction
//! around them, so the table may change between the two.
//!
//! Both round-trips race the caller's cancellation token and a deadline.

use crate::db::backend::SqlBackend;
use crate::db::connection::Database;
use crate::db::plan;
use crate::db::types::{ExecOutcome, ResultSet};
use crate::error::{DbError, DbResult};
use crate::tools::guard::{self, StatementCategory};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-call cancellation and deadline.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub cancel: CancellationToken,
    /// Overrides the executor's default timeout when set.
    pub timeout: Option<Duration>,
}

impl CallContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Runs statements only after the planner agrees with the declared category.
pub struct QueryExecutor<B> {
    backend: Arc<B>,
    read_only: bool,
    explain_check: bool,
    default_timeout: Duration,
}

impl QueryExecutor<Database> {
    /// Build an executor over the shared connection handle, taking the
    /// read-only and explain-check flags from its descriptor.
    pub fn for_database(database: Arc<Database>, default_timeout: Duration) -> Self {
        let read_only = database.descriptor().read_only();
        let explain_check = database.descriptor().explain_check();
        Self::new(database)
            .with_read_only(read_only)
            .with_explain_check(explain_check)
            .with_default_timeout(default_timeout)
    }
}

impl<B: SqlBackend> QueryExecutor<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            read_only: false,
            explain_check: true,
            default_timeout: Duration::from_secs(crate::config::DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_explain_check(mut self, explain_check: bool) -> Self {
        self.explain_check = explain_check;
        self
    }

    pub fn with_default_timeout(mut self, default_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self
    }

    /// Query mode: check, run, and collect every row.
    pub async fn run_query(
        &self,
        query: &str,
        declared: StatementCategory,
        ctx: &CallContext,
    ) -> DbResult<ResultSet> {
        validate_query(query)?;
        let start = Instant::now();

        self.check_intent(query, declared, ctx).await?;

        debug!(sql = %query, category = %declared, "Executing query");
        let result = self
            .bounded("query execution", ctx, self.backend.fetch_all(query))
            .await
            .map_err(|e| match e {
                // ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION
                DbError::Execution {
                    sql_state: Some(ref code),
                    ..
                } if self.read_only && code == "25006" => {
                    warn!(category = %declared, "Server refused a write on a read-only session");
                    read_only_refusal()
                }
                other => other,
            })?;

        info!(
            category = %declared,
            rows = result.row_count(),
            columns = result.columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(result)
    }

    /// Mutation mode: check, run, and describe the outcome.
    pub async fn run_exec(
        &self,
        query: &str,
        declared: StatementCategory,
        ctx: &CallContext,
    ) -> DbResult<String> {
        validate_query(query)?;

        if self.read_only {
            warn!(category = %declared, "Refusing statement on read-only connection");
            return Err(read_only_refusal());
        }

        let start = Instant::now();
        self.check_intent(query, declared, ctx).await?;

        debug!(sql = %query, category = %declared, "Executing statement");
        let outcome = self
            .bounded("statement execution", ctx, self.backend.execute(query))
            .await?;

        info!(
            category = %declared,
            rows_affected = outcome.rows_affected,
            last_insert_id = ?outcome.last_insert_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement completed"
        );
        Ok(format_outcome(declared, &outcome))
    }

    /// Return the `CREATE TABLE` statement of `name`.
    pub async fn describe_table(&self, name: &str, ctx: &CallContext) -> DbResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::invalid_input("Table name cannot be empty"));
        }

        debug!(table = %name, "Describing table");
        let ddl = self
            .bounded("describe table", ctx, self.backend.show_create_table(name))
            .await
            .map_err(|e| match e {
                // ER_NO_SUCH_TABLE
                DbError::Execution {
                    sql_state: Some(ref code),
                    ..
                } if code == "42S02" => table_not_found(name),
                other => other,
            })?;

        ddl.ok_or_else(|| table_not_found(name))
    }

    /// Classify the query with `EXPLAIN` and compare against `declared`.
    async fn check_intent(
        &self,
        query: &str,
        declared: StatementCategory,
        ctx: &CallContext,
    ) -> DbResult<()> {
        if !declared.requires_plan_check() || !self.explain_check {
            return Ok(());
        }

        debug!(sql = %query, category = %declared, "Checking query plan");
        let observed = self
            .bounded("plan check", ctx, plan::classify(&*self.backend, query))
            .await
            .inspect_err(|e| {
                if e.is_guard_failure() {
                    warn!(category = %declared, error = %e, "Query plan could not be classified");
                }
            })?;

        guard::check(&observed, declared).inspect_err(|_| {
            warn!(
                declared = %declared,
                observed = %observed,
                "Query plan does not match declared category"
            );
        })
    }

    /// Race `fut` against the caller's cancellation and the deadline.
    async fn bounded<T, F>(&self, operation: &str, ctx: &CallContext, fut: F) -> DbResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let limit = ctx.timeout.unwrap_or(self.default_timeout);
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                warn!(operation, "Cancelled by caller");
                Err(DbError::cancelled(operation))
            }
            result = timeout(limit, fut) => match result {
                Ok(inner) => inner,
                Err(_) => {
                    warn!(operation, timeout_ms = limit.as_millis() as u64, "Deadline exceeded");
                    Err(DbError::timeout(operation, limit))
                }
            },
        }
    }
}

/// Render a mutation outcome the way the tools report it.
pub fn format_outcome(declared: StatementCategory, outcome: &ExecOutcome) -> String {
    match declared {
        StatementCategory::Insert => format!(
            "{} rows affected, last insert id: {}",
            outcome.rows_affected,
            outcome.last_insert_id.unwrap_or(0)
        ),
        _ => format!("{} rows affected", outcome.rows_affected),
    }
}

fn validate_query(query: &str) -> DbResult<()> {
    if query.trim().is_empty() {
        return Err(DbError::invalid_input("Query cannot be empty"));
    }
    Ok(())
}

fn read_only_refusal() -> DbError {
    DbError::permission("write", "Server is running in read-only mode")
}

fn table_not_found(name: &str) -> DbError {
    DbError::not_found(format!("table {} does not exist", name))
}
