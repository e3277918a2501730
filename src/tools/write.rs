//! Mutation tools.
//!
//! This module implements the `write_query`, `update_query`, `delete_query`,
//! `create_table` and `alter_table` MCP tools. The three DML tools declare
//! their statement type and are checked against the planner; the DDL tools
//! skip the check, since `EXPLAIN` cannot classify DDL.

use crate::db::{CallContext, QueryExecutor, SqlBackend};
use crate::error::DbResult;
use crate::tools::guard::StatementCategory;
use crate::tools::query::QueryInput;
use std::sync::Arc;

pub struct WriteToolHandler<B> {
    executor: Arc<QueryExecutor<B>>,
}

impl<B: SqlBackend> WriteToolHandler<B> {
    pub fn new(executor: Arc<QueryExecutor<B>>) -> Self {
        Self { executor }
    }

    pub async fn write_query(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        self.run(input, StatementCategory::Insert, ctx).await
    }

    pub async fn update_query(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        self.run(input, StatementCategory::Update, ctx).await
    }

    pub async fn delete_query(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        self.run(input, StatementCategory::Delete, ctx).await
    }

    pub async fn create_table(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        self.run(input, StatementCategory::None, ctx).await
    }

    pub async fn alter_table(&self, input: QueryInput, ctx: &CallContext) -> DbResult<String> {
        self.run(input, StatementCategory::None, ctx).await
    }

    async fn run(
        &self,
        input: QueryInput,
        declared: StatementCategory,
        ctx: &CallContext,
    ) -> DbResult<String> {
        self.executor.run_exec(&input.query, declared, ctx).await
    }
}
