//! MCP tool implementations.
//!
//! This module contains the tool handlers and their shared pieces:
//! - `query`: `read_query`
//! - `write`: `write_query`, `update_query`, `delete_query`, `create_table`, `alter_table`
//! - `schema`: `list_database`, `list_table`, `desc_table`
//! - `guard`: declared statement category vs. planner-reported type
//! - `format`: CSV rendering of result rows

pub mod format;
pub mod guard;
pub mod query;
pub mod schema;
pub mod write;

pub use guard::StatementCategory;
pub use query::{QueryInput, QueryToolHandler};
pub use schema::{DescTableInput, SchemaToolHandler};
pub use write::WriteToolHandler;
