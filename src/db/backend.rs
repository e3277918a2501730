//! The seam between the guarded executor and the MySQL driver.
//!
//! [`SqlBackend`] is the minimal set of round-trips the executor needs. The
//! production implementation runs on the lazily opened [`Database`] handle;
//! tests script an in-memory backend instead.

use crate::db::connection::Database;
use crate::db::types::{self, ExecOutcome, ResultSet, SqlValue};
use crate::error::DbResult;
use futures_util::TryStreamExt;
use sqlx::{Column, Executor};
use std::future::Future;
use tracing::debug;

/// Database round-trips used by the statement executor.
pub trait SqlBackend: Send + Sync {
    /// Run `EXPLAIN <query>` and return every plan row.
    fn explain(&self, query: &str) -> impl Future<Output = DbResult<ResultSet>> + Send;

    /// Run a row-returning statement and collect all rows.
    fn fetch_all(&self, query: &str) -> impl Future<Output = DbResult<ResultSet>> + Send;

    /// Run a statement that does not return rows.
    fn execute(&self, query: &str) -> impl Future<Output = DbResult<ExecOutcome>> + Send;

    /// Return the DDL of a table, or `None` when the server returns no row.
    fn show_create_table(&self, name: &str)
    -> impl Future<Output = DbResult<Option<String>>> + Send;
}

impl SqlBackend for Database {
    async fn explain(&self, query: &str) -> DbResult<ResultSet> {
        self.fetch_all(&format!("EXPLAIN {}", query)).await
    }

    async fn fetch_all(&self, query: &str) -> DbResult<ResultSet> {
        let pool = self.acquire().await?;

        // Raw SQL goes over the text protocol; some statements cannot be prepared.
        let rows: Vec<sqlx::mysql::MySqlRow> = pool.fetch(query).try_collect().await?;

        let columns = match rows.first() {
            Some(row) => types::column_names(row),
            None => match pool.describe(query).await {
                Ok(described) => described
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                Err(e) => {
                    debug!(error = %e, "Could not describe empty result; header left empty");
                    Vec::new()
                }
            },
        };

        let rows = rows.iter().map(types::decode_row).collect();
        Ok(ResultSet::new(columns, rows))
    }

    async fn execute(&self, query: &str) -> DbResult<ExecOutcome> {
        let pool = self.acquire().await?;
        let result = pool.execute(query).await?;
        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id()),
        })
    }

    async fn show_create_table(&self, name: &str) -> DbResult<Option<String>> {
        let result = self
            .fetch_all(&format!("SHOW CREATE TABLE {}", quote_identifier(name)))
            .await?;
        Ok(create_statement(&result))
    }
}

/// Quote a possibly schema-qualified identifier with backticks.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

/// The DDL column of a `SHOW CREATE TABLE` result. Views report `Create View`.
pub fn create_statement(result: &ResultSet) -> Option<String> {
    let row = result.rows.first()?;
    ["Create Table", "Create View"]
        .iter()
        .find_map(|col| match row.get(*col) {
            Some(SqlValue::Null) | None => None,
            Some(value) => Some(value.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::SqlRow;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("shop.users"), "`shop`.`users`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_create_statement_table() {
        let mut row = SqlRow::new();
        row.insert("Table".into(), SqlValue::text("users"));
        row.insert(
            "Create Table".into(),
            SqlValue::text("CREATE TABLE `users` (`id` int)"),
        );
        let rs = ResultSet::new(vec!["Table".into(), "Create Table".into()], vec![row]);
        assert_eq!(
            create_statement(&rs).as_deref(),
            Some("CREATE TABLE `users` (`id` int)")
        );
    }

    #[test]
    fn test_create_statement_view() {
        let mut row = SqlRow::new();
        row.insert("View".into(), SqlValue::text("v"));
        row.insert("Create View".into(), SqlValue::text("CREATE VIEW `v` AS select 1"));
        let rs = ResultSet::new(vec!["View".into(), "Create View".into()], vec![row]);
        assert!(create_statement(&rs).unwrap().starts_with("CREATE VIEW"));
    }

    #[test]
    fn test_create_statement_empty() {
        assert_eq!(create_statement(&ResultSet::default()), None);
    }
}
