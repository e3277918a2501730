//! Plan classification through MySQL's own `EXPLAIN`.

use crate::db::backend::SqlBackend;
use crate::db::types::{ResultSet, SqlRow, SqlValue};
use crate::error::{DbError, DbResult};
use tracing::debug;

/// One row of `EXPLAIN` output.
///
/// Only `select_type` drives the guard; the other fields are kept for logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanRow {
    pub id: Option<String>,
    pub select_type: Option<String>,
    pub table: Option<String>,
    pub access_type: Option<String>,
    pub key: Option<String>,
    pub rows: Option<String>,
    pub extra: Option<String>,
}

impl PlanRow {
    /// Build a plan row from a decoded result row. NULL cells become `None`.
    pub fn from_row(row: &SqlRow) -> Self {
        let field = |name: &str| match row.get(name) {
            None | Some(SqlValue::Null) => None,
            Some(value) => Some(value.to_string()),
        };

        Self {
            id: field("id"),
            select_type: field("select_type"),
            table: field("table"),
            access_type: field("type"),
            key: field("key"),
            rows: field("rows"),
            extra: field("Extra"),
        }
    }

    pub fn from_result(result: &ResultSet) -> Vec<Self> {
        result.rows.iter().map(Self::from_row).collect()
    }
}

/// Extract the observed statement type from a complete plan.
///
/// Exactly one row with a non-NULL `select_type` is required.
pub fn classify_plan_rows(rows: &[PlanRow]) -> DbResult<String> {
    match rows {
        [only] => only
            .select_type
            .clone()
            .ok_or_else(|| DbError::plan_ambiguity(1)),
        _ => Err(DbError::plan_ambiguity(rows.len())),
    }
}

/// Ask the planner what `query` really is.
pub async fn classify<B: SqlBackend>(backend: &B, query: &str) -> DbResult<String> {
    let result = backend.explain(query).await?;
    let rows = PlanRow::from_result(&result);

    for row in &rows {
        debug!(
            id = ?row.id,
            select_type = ?row.select_type,
            table = ?row.table,
            access_type = ?row.access_type,
            key = ?row.key,
            rows = ?row.rows,
            extra = ?row.extra,
            "Plan row"
        );
    }

    classify_plan_rows(&rows)
}
