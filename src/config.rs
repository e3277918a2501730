//! Configuration handling for the MySQL MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use crate::db::ConnectionDescriptor;
use crate::error::DbResult;
use clap::{Parser, ValueEnum};
use std::time::Duration;

pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_NAME: &str = "mydatabase";
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the MySQL MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server for MySQL - runs SQL only after the query planner confirms the declared statement type",
    version,
    author
)]
pub struct Config {
    /// MySQL server host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// MySQL server port
    #[arg(long, default_value_t = DEFAULT_DB_PORT, env = "DB_PORT")]
    pub db_port: u16,

    /// MySQL user name
    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    /// MySQL password (sensitive - never logged)
    #[arg(long, default_value = "", env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Database (schema) to connect to
    #[arg(long, default_value = DEFAULT_DB_NAME, env = "DB_NAME")]
    pub db_name: String,

    /// Refuse every statement that goes through the mutation path
    #[arg(long, env = "DB_READ_ONLY")]
    pub read_only: bool,

    /// Skip the EXPLAIN-based statement type check for every tool
    #[arg(long, env = "DB_NO_EXPLAIN_CHECK")]
    pub no_explain_check: bool,

    /// Maximum connections held by the shared connection handle
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "DB_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Query timeout in seconds, applied to both the plan check and the execution
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "MCP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: String::new(),
            db_name: DEFAULT_DB_NAME.to_string(),
            read_only: false,
            no_explain_check: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Build the connection descriptor from the database settings.
    pub fn descriptor(&self) -> DbResult<ConnectionDescriptor> {
        Ok(ConnectionDescriptor::new(
            &self.db_host,
            self.db_port,
            &self.db_user,
            &self.db_password,
            &self.db_name,
        )?
        .with_read_only(self.read_only)
        .with_explain_check(!self.no_explain_check)
        .with_pool_limits(self.max_connections, self.connect_timeout_duration())?)
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
