//! Read query tool.
//!
//! This module implements the `read_query` MCP tool. The query only runs when
//! the planner does not classify it as INSERT, UPDATE or DELETE.

use crate::db::{CallContext, QueryExecutor, SqlBackend};
use crate::error::DbResult;
use crate::tools::format;
use crate::tools::guard::StatementCategory;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Input shared by every tool that takes a single SQL statement.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// The SQL query to execute
    pub query: String,
}

pub struct QueryToolHandler<B> {
    executor: Arc<QueryExecutor<B>>,
}

impl<B: SqlBackend> QueryToolHandler<B> {
    pub fn new(executor: Arc<QueryExecutor<B>>) -> Self {
        Self { executor }
    }

    /// Run a SELECT and render the rows as CSV.
    pub async fn read_query(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        let result = self
            .executor
            .run_query(&input.query, StatementCategory::Select, ctx)
            .await?;
        format::render_result(&result)
    }
}
