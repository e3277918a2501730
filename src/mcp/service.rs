//! MCP service implementation using rmcp.
//!
//! This module defines the MySqlService struct with the nine MySQL tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//! Tool failures are returned as error results (`is_error = true`) carrying
//! the message, never as protocol errors.

use crate::db::{CallContext, Database, QueryExecutor};
use crate::error::DbResult;
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{DescTableInput, SchemaToolHandler};
use crate::tools::write::WriteToolHandler;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct MySqlService {
    /// Guarded executor over the shared connection handle
    executor: Arc<QueryExecutor<Database>>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MySqlService {
    pub fn new(executor: Arc<QueryExecutor<Database>>) -> Self {
        Self {
            executor,
            tool_router: Self::tool_router(),
        }
    }

    fn queries(&self) -> QueryToolHandler<Database> {
        QueryToolHandler::new(self.executor.clone())
    }

    fn writes(&self) -> WriteToolHandler<Database> {
        WriteToolHandler::new(self.executor.clone())
    }

    fn schema(&self) -> SchemaToolHandler<Database> {
        SchemaToolHandler::new(self.executor.clone())
    }
}

/// Per-call context carrying the request's cancellation token.
fn call_context(context: &RequestContext<RoleServer>) -> CallContext {
    CallContext::new(context.ct.clone())
}

/// Turn a handler result into a tool result; failures become error content.
fn into_tool_result(tool: &str, result: DbResult<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => {
            debug!(tool, error = %e, "Tool call failed");
            Ok(CallToolResult::error(vec![Content::text(e.to_tool_message())]))
        }
    }
}

#[tool_router]
impl MySqlService {
    #[tool(description = "List all databases in the MySQL server")]
    async fn list_database(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.schema().list_databases(&call_context(&context)).await;
        into_tool_result("list_database", result)
    }

    #[tool(description = "List all tables in the MySQL server")]
    async fn list_table(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.schema().list_tables(&call_context(&context)).await;
        into_tool_result("list_table", result)
    }

    #[tool(
        description = "Create a new table in the MySQL server. Make sure you have added proper comments for each column and the table itself"
    )]
    async fn create_table(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .writes()
            .create_table(input, &call_context(&context))
            .await;
        into_tool_result("create_table", result)
    }

    #[tool(
        description = "Alter an existing table in the MySQL server. Make sure you have updated comments for each modified column. DO NOT drop table or existing columns!"
    )]
    async fn alter_table(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .writes()
            .alter_table(input, &call_context(&context))
            .await;
        into_tool_result("alter_table", result)
    }

    #[tool(description = "Describe the structure of a table")]
    async fn desc_table(
        &self,
        Parameters(input): Parameters<DescTableInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .schema()
            .describe_table(input, &call_context(&context))
            .await;
        into_tool_result("desc_table", result)
    }

    #[tool(
        description = "Execute a read-only SQL query. Make sure you have knowledge of the table structure before writing WHERE conditions. Call `desc_table` first if necessary"
    )]
    async fn read_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .queries()
            .read_query(input, &call_context(&context))
            .await;
        into_tool_result("read_query", result)
    }

    #[tool(
        description = "Execute a write SQL query. Make sure you have knowledge of the table structure before executing the query. Make sure the data types match the columns' definitions"
    )]
    async fn write_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .writes()
            .write_query(input, &call_context(&context))
            .await;
        into_tool_result("write_query", result)
    }

    #[tool(
        description = "Execute an update SQL query. Make sure you have knowledge of the table structure before executing the query. Make sure there is always a WHERE condition. Call `desc_table` first if necessary"
    )]
    async fn update_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .writes()
            .update_query(input, &call_context(&context))
            .await;
        into_tool_result("update_query", result)
    }

    #[tool(
        description = "Execute a delete SQL query. Make sure you have knowledge of the table structure before executing the query. Make sure there is always a WHERE condition. Call `desc_table` first if necessary"
    )]
    async fn delete_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .writes()
            .delete_query(input, &call_context(&context))
            .await;
        into_tool_result("delete_query", result)
    }
}

#[tool_handler]
impl ServerHandler for MySqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL tools whose statements are checked by the server's query planner.\n\
                \n\
                ## Workflow\n\
                1. Call `list_table` to see the tables of the connected database\n\
                2. Call `desc_table` before writing WHERE conditions or INSERT column lists\n\
                3. Use the tool that matches the statement: `read_query` for SELECT,\n\
                   `write_query` for INSERT, `update_query` for UPDATE, `delete_query` for DELETE\n\
                \n\
                ## Plan check\n\
                Each of the four query tools runs `EXPLAIN` first. A statement whose plan does\n\
                not match the tool is refused without running. Queries whose plan has more than\n\
                one row (joins, subqueries, unions) cannot be classified and are refused too.\n\
                \n\
                ## Results\n\
                Rows come back as CSV with a header line; NULL is written as `NULL`.\n\
                Mutations report the affected row count, and `write_query` also reports the\n\
                last insert id."
                    .to_string(),
            ),
        }
    }
}
