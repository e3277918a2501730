//! MySQL MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to query and modify a MySQL database. Each statement is classified by
//! MySQL's own `EXPLAIN` and only runs when the planner agrees with the
//! statement type the calling tool declared.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::MySqlService;
