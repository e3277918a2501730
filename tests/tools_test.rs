//! Integration tests for the tool handlers over a scripted backend.

mod common;

use common::{Call, ScriptedBackend, columns, row};
use mysql_mcp_server::db::{CallContext, QueryExecutor, ResultSet, SqlValue};
use mysql_mcp_server::error::DbError;
use mysql_mcp_server::tools::{
    DescTableInput, QueryInput, QueryToolHandler, SchemaToolHandler, WriteToolHandler,
};
use std::sync::Arc;

fn input(query: &str) -> QueryInput {
    QueryInput {
        query: query.to_string(),
    }
}

fn shared(backend: ScriptedBackend) -> (Arc<QueryExecutor<ScriptedBackend>>, Arc<ScriptedBackend>) {
    let backend = Arc::new(backend);
    (Arc::new(QueryExecutor::new(backend.clone())), backend)
}

#[tokio::test]
async fn test_read_query_renders_csv() {
    let sql = "SELECT id, note FROM notes";
    let result = ResultSet::new(
        columns(&["id", "note"]),
        vec![
            row(&[("id", SqlValue::Int(1)), ("note", SqlValue::text("x,y"))]),
            row(&[("id", SqlValue::Int(2)), ("note", SqlValue::Null)]),
        ],
    );
    let (executor, _) = shared(
        ScriptedBackend::new()
            .with_plan(sql, &["SIMPLE"])
            .with_rows(sql, result),
    );
    let handler = QueryToolHandler::new(executor);

    let csv = handler
        .read_query(input(sql), &CallContext::default())
        .await
        .unwrap();

    assert_eq!(csv, "id,note\n1,\"x,y\"\n2,NULL\n");
}

#[tokio::test]
async fn test_read_query_refuses_mutation_plan() {
    let sql = "DELETE FROM notes";
    let (executor, backend) = shared(ScriptedBackend::new().with_plan(sql, &["DELETE"]));
    let handler = QueryToolHandler::new(executor);

    let err = handler
        .read_query(input(sql), &CallContext::default())
        .await
        .unwrap_err();

    assert!(err.to_tool_message().contains("Query plan does not match expected pattern"));
    assert!(!backend.executed());
}

#[tokio::test]
async fn test_list_tables_skips_plan_check() {
    let result = ResultSet::new(
        columns(&["Tables_in_shop"]),
        vec![
            row(&[("Tables_in_shop", SqlValue::text("orders"))]),
            row(&[("Tables_in_shop", SqlValue::text("users"))]),
        ],
    );
    let (executor, backend) = shared(ScriptedBackend::new().with_rows("SHOW TABLES", result));
    let handler = SchemaToolHandler::new(executor);

    let csv = handler.list_tables(&CallContext::default()).await.unwrap();

    assert_eq!(csv, "Tables_in_shop\norders\nusers\n");
    assert_eq!(backend.calls(), vec![Call::Fetch("SHOW TABLES".to_string())]);
}

#[tokio::test]
async fn test_list_databases() {
    let result = ResultSet::new(
        columns(&["Database"]),
        vec![
            row(&[("Database", SqlValue::text("information_schema"))]),
            row(&[("Database", SqlValue::text("shop"))]),
        ],
    );
    let (executor, backend) = shared(ScriptedBackend::new().with_rows("SHOW DATABASES", result));
    let handler = SchemaToolHandler::new(executor);

    let csv = handler.list_databases(&CallContext::default()).await.unwrap();

    assert_eq!(csv, "Database\ninformation_schema\nshop\n");
    assert_eq!(backend.calls(), vec![Call::Fetch("SHOW DATABASES".to_string())]);
}

#[tokio::test]
async fn test_desc_table() {
    let ddl = "CREATE TABLE `orders` (`id` int NOT NULL)";
    let (executor, _) = shared(ScriptedBackend::new().with_table("orders", ddl));
    let handler = SchemaToolHandler::new(executor);

    let found = handler
        .describe_table(
            DescTableInput {
                name: "orders".to_string(),
            },
            &CallContext::default(),
        )
        .await
        .unwrap();
    assert_eq!(found, ddl);

    let missing = handler
        .describe_table(
            DescTableInput {
                name: "refunds".to_string(),
            },
            &CallContext::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, DbError::NotFound { .. }));
    assert_eq!(missing.to_string(), "table refunds does not exist");
}

#[tokio::test]
async fn test_write_tools_declare_their_category() {
    let insert = "INSERT INTO notes (note) VALUES ('hi')";
    let update = "UPDATE notes SET note = 'yo' WHERE id = 1";
    let delete = "DELETE FROM notes WHERE id = 1";
    let (executor, _) = shared(
        ScriptedBackend::new()
            .with_plan(insert, &["INSERT"])
            .with_plan(update, &["UPDATE"])
            .with_plan(delete, &["DELETE"])
            .with_outcome(1, 9),
    );
    let handler = WriteToolHandler::new(executor);
    let ctx = CallContext::default();

    assert_eq!(
        handler.write_query(input(insert), &ctx).await.unwrap(),
        "1 rows affected, last insert id: 9"
    );
    assert_eq!(handler.update_query(input(update), &ctx).await.unwrap(), "1 rows affected");
    assert_eq!(handler.delete_query(input(delete), &ctx).await.unwrap(), "1 rows affected");

    // Each tool refuses a statement meant for another one.
    assert!(handler.update_query(input(delete), &ctx).await.is_err());
    assert!(handler.delete_query(input(insert), &ctx).await.is_err());
    assert!(handler.write_query(input(update), &ctx).await.is_err());
}

#[tokio::test]
async fn test_ddl_tools_run_without_plan_check() {
    let create = "CREATE TABLE notes (id INT PRIMARY KEY COMMENT 'id') COMMENT 'notes'";
    let alter = "ALTER TABLE notes ADD COLUMN note TEXT COMMENT 'body'";
    let (executor, backend) = shared(ScriptedBackend::new());
    let handler = WriteToolHandler::new(executor);
    let ctx = CallContext::default();

    assert_eq!(handler.create_table(input(create), &ctx).await.unwrap(), "0 rows affected");
    assert_eq!(handler.alter_table(input(alter), &ctx).await.unwrap(), "0 rows affected");
    assert_eq!(
        backend.calls(),
        vec![
            Call::Execute(create.to_string()),
            Call::Execute(alter.to_string())
        ]
    );
}

#[tokio::test]
async fn test_read_only_blocks_ddl_tools() {
    let backend = Arc::new(ScriptedBackend::new());
    let executor = Arc::new(QueryExecutor::new(backend.clone()).with_read_only(true));
    let handler = WriteToolHandler::new(executor);

    let err = handler
        .create_table(input("CREATE TABLE t (id INT)"), &CallContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Permission { .. }));
    assert!(backend.calls().is_empty());
}
