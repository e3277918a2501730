//! MySQL MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to run SQL against one MySQL database, with every query's statement type
//! confirmed by the server's own planner before it runs.

use mysql_mcp_server::config::{Config, TransportMode};
use mysql_mcp_server::db::{Database, QueryExecutor};
use mysql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    info!(
        transport = %config.transport,
        "Starting MySQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let descriptor = config.descriptor()?;
    info!(
        connection = %descriptor.masked_connection_string(),
        read_only = descriptor.read_only(),
        "Using database"
    );

    if !descriptor.explain_check() {
        warn!("EXPLAIN check disabled: statements run without plan classification");
    }

    let database = Arc::new(Database::new(descriptor));

    // The startup connection is the only fatal database failure
    if let Err(e) = database.acquire().await {
        error!(error = %e, "Failed to connect to database");
        return Err(e.to_tool_message().into());
    }

    let executor = Arc::new(QueryExecutor::for_database(
        database,
        config.query_timeout_duration(),
    ));

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(executor).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                executor,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
