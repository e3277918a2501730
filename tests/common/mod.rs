//! Scripted in-memory backend shared by the integration tests.
//!
//! Every round-trip is recorded, so tests can assert what reached the
//! "database" and in which order.

#![allow(dead_code)]

use mysql_mcp_server::db::{ExecOutcome, ResultSet, SqlBackend, SqlRow, SqlValue};
use mysql_mcp_server::error::{DbError, DbResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One round-trip seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Explain(String),
    Fetch(String),
    Execute(String),
    ShowCreate(String),
}

#[derive(Default)]
pub struct ScriptedBackend {
    plans: HashMap<String, ResultSet>,
    results: HashMap<String, ResultSet>,
    tables: HashMap<String, String>,
    outcome: ExecOutcome,
    execute_error: Option<(String, String)>,
    fetch_error: Option<(String, String)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the `EXPLAIN` output of `query` as one row per select_type.
    pub fn with_plan(mut self, query: &str, select_types: &[&str]) -> Self {
        self.plans.insert(query.to_string(), plan_result(select_types));
        self
    }

    pub fn with_rows(mut self, query: &str, result: ResultSet) -> Self {
        self.results.insert(query.to_string(), result);
        self
    }

    pub fn with_table(mut self, name: &str, ddl: &str) -> Self {
        self.tables.insert(name.to_string(), ddl.to_string());
        self
    }

    pub fn with_outcome(mut self, rows_affected: u64, last_insert_id: u64) -> Self {
        self.outcome = ExecOutcome {
            rows_affected,
            last_insert_id: Some(last_insert_id),
        };
        self
    }

    /// Make every `execute` fail with a database error carrying `sql_state`.
    pub fn with_execute_error(mut self, message: &str, sql_state: &str) -> Self {
        self.execute_error = Some((message.to_string(), sql_state.to_string()));
        self
    }

    /// Make every `fetch_all` fail with a database error carrying `sql_state`.
    pub fn with_fetch_error(mut self, message: &str, sql_state: &str) -> Self {
        self.fetch_error = Some((message.to_string(), sql_state.to_string()));
        self
    }

    /// Delay every round-trip, for timeout and cancellation tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn executed(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::Execute(_) | Call::Fetch(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl SqlBackend for ScriptedBackend {
    async fn explain(&self, query: &str) -> DbResult<ResultSet> {
        self.record(Call::Explain(query.to_string()));
        self.pause().await;
        Ok(self.plans.get(query).cloned().unwrap_or_default())
    }

    async fn fetch_all(&self, query: &str) -> DbResult<ResultSet> {
        self.record(Call::Fetch(query.to_string()));
        self.pause().await;
        if let Some((message, code)) = &self.fetch_error {
            return Err(DbError::execution(message.clone(), Some(code.clone())));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn execute(&self, query: &str) -> DbResult<ExecOutcome> {
        self.record(Call::Execute(query.to_string()));
        self.pause().await;
        match &self.execute_error {
            Some((message, code)) => Err(DbError::execution(message.clone(), Some(code.clone()))),
            None => Ok(self.outcome),
        }
    }

    async fn show_create_table(&self, name: &str) -> DbResult<Option<String>> {
        self.record(Call::ShowCreate(name.to_string()));
        self.pause().await;
        Ok(self.tables.get(name).cloned())
    }
}

/// An `EXPLAIN` result with one row per select_type.
pub fn plan_result(select_types: &[&str]) -> ResultSet {
    let columns = ["id", "select_type", "table", "type", "key", "rows", "Extra"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = select_types
        .iter()
        .enumerate()
        .map(|(i, st)| {
            row(&[
                ("id", SqlValue::Int(i as i64 + 1)),
                ("select_type", SqlValue::text(*st)),
                ("table", SqlValue::text("t")),
                ("type", SqlValue::text("ALL")),
                ("key", SqlValue::Null),
                ("rows", SqlValue::UInt(1)),
                ("Extra", SqlValue::Null),
            ])
        })
        .collect();
    ResultSet::new(columns, rows)
}

pub fn row(pairs: &[(&str, SqlValue)]) -> SqlRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
