//! Schema introspection tools.
//!
//! This module implements the `list_database`, `list_table` and `desc_table`
//! MCP tools. None of them go through the plan check.

use crate::db::{CallContext, QueryExecutor, SqlBackend};
use crate::error::DbResult;
use crate::tools::format;
use crate::tools::guard::StatementCategory;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Input for the desc_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescTableInput {
    /// The name of the table to describe
    pub name: String,
}

pub struct SchemaToolHandler<B> {
    executor: Arc<QueryExecutor<B>>,
}

impl<B: SqlBackend> SchemaToolHandler<B> {
    pub fn new(executor: Arc<QueryExecutor<B>>) -> Self {
        Self { executor }
    }

    /// `SHOW DATABASES`, rendered as CSV.
    pub async fn list_databases(&self, ctx: &CallContext) -> DbResult<String> {
        self.show("SHOW DATABASES", ctx).await
    }

    /// `SHOW TABLES` in the connected database, rendered as CSV.
    pub async fn list_tables(&self, ctx: &CallContext) -> DbResult<String> {
        self.show("SHOW TABLES", ctx).await
    }

    /// The `CREATE TABLE` statement of one table.
    pub async fn describe_table(
        &self,
        input: DescTableInput,
        ctx: &CallContext,
    ) -> DbResult<String> {
        self.executor.describe_table(&input.name, ctx).await
    }

    async fn show(&self, sql: &str, ctx: &CallContext) -> DbResult<String> {
        let result = self
            .executor
            .run_query(sql, StatementCategory::None, ctx)
            .await?;
        format::render_result(&result)
    }
}
