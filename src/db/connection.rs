//! Connection descriptor and the lazily opened connection handle.
//!
//! A [`Database`] owns at most one `MySqlPool` for its whole lifetime. The pool
//! is opened on the first [`Database::acquire`] call and shared by every later
//! caller; it is never replaced, so a failed server is not reconnected to.

use crate::error::{DbError, DbResult};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{Executor, MySqlPool};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

/// Run on every new connection of a read-only server, so the server itself
/// refuses writes that slip past the plan check.
pub const READ_ONLY_SESSION_SQL: &str = "SET SESSION TRANSACTION READ ONLY";

/// Immutable description of the MySQL server to talk to.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    host: String,
    port: u16,
    user: String,
    /// Contains sensitive data - never log
    password: String,
    database: String,
    /// Contains sensitive data - never log
    connection_string: String,
    read_only: bool,
    explain_check: bool,
    max_connections: u32,
    connect_timeout: Duration,
}

impl ConnectionDescriptor {
    /// Build a descriptor and derive its `mysql://` connection string.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> DbResult<Self> {
        let host = host.into().trim().to_string();
        let user = user.into();
        let password = password.into();
        let database = database.into().trim().to_string();

        if host.is_empty() {
            return Err(DbError::invalid_input("Database host cannot be empty"));
        }
        if port == 0 {
            return Err(DbError::invalid_input("Database port must be greater than 0"));
        }
        if user.is_empty() {
            return Err(DbError::invalid_input("Database user cannot be empty"));
        }
        if database.is_empty() {
            return Err(DbError::invalid_input("Database name cannot be empty"));
        }

        let connection_string = Self::build_connection_string(&host, port, &user, &password, &database)?;

        Ok(Self {
            host,
            port,
            user,
            password,
            database,
            connection_string,
            read_only: false,
            explain_check: true,
            max_connections: crate::config::DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(crate::config::DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_explain_check(mut self, explain_check: bool) -> Self {
        self.explain_check = explain_check;
        self
    }

    /// Set the pool size and the acquire timeout of the connection handle.
    pub fn with_pool_limits(mut self, max_connections: u32, connect_timeout: Duration) -> DbResult<Self> {
        if max_connections == 0 {
            return Err(DbError::invalid_input(
                "max_connections must be greater than 0",
            ));
        }
        self.max_connections = max_connections;
        self.connect_timeout = connect_timeout;
        Ok(self)
    }

    /// Credentials are percent-encoded into the userinfo part.
    fn build_connection_string(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
    ) -> DbResult<String> {
        let invalid = |what: &str| DbError::invalid_input(format!("Invalid {} for connection string", what));

        let mut url = Url::parse(&format!("mysql://{}:{}", host, port))
            .map_err(|e| DbError::invalid_input(format!("Invalid database host: {e}")))?;
        url.set_username(user).map_err(|_| invalid("user"))?;
        if !password.is_empty() {
            url.set_password(Some(password))
                .map_err(|_| invalid("password"))?;
        }
        url.set_path(database);
        Ok(url.to_string())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn explain_check(&self) -> bool {
        self.explain_check
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Statement to run on each fresh connection, if any.
    pub fn session_setup(&self) -> Option<&'static str> {
        self.read_only.then_some(READ_ONLY_SESSION_SQL)
    }

    /// Get a display-safe version of the connection string (password masked).
    pub fn masked_connection_string(&self) -> String {
        if self.password.is_empty() {
            return self.connection_string.clone();
        }
        match Url::parse(&self.connection_string) {
            Ok(mut url) => {
                let _ = url.set_password(Some("****"));
                url.to_string()
            }
            Err(_) => "mysql://****".to_string(),
        }
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("connection_string", &self.masked_connection_string())
            .field("read_only", &self.read_only)
            .field("explain_check", &self.explain_check)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

/// Connection provider: one descriptor, at most one live connection handle.
#[derive(Debug)]
pub struct Database {
    descriptor: ConnectionDescriptor,
    handle: OnceCell<MySqlPool>,
}

impl Database {
    pub fn new(descriptor: ConnectionDescriptor) -> Self {
        Self {
            descriptor,
            handle: OnceCell::new(),
        }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// True once the handle has been opened successfully.
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    /// Return the shared connection handle, opening it on first use.
    ///
    /// Concurrent first callers wait on the same initialization. A failed open
    /// leaves the cell empty and is reported to the caller without retrying.
    pub async fn acquire(&self) -> DbResult<&MySqlPool> {
        self.handle.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> DbResult<MySqlPool> {
        let descriptor = &self.descriptor;
        info!(
            host = %descriptor.host,
            port = descriptor.port,
            database = %descriptor.database,
            read_only = descriptor.read_only,
            "Connecting to database"
        );

        let options = MySqlConnectOptions::from_str(&descriptor.connection_string)
            .map_err(|e| {
                DbError::connection(
                    format!("Invalid MySQL connection string: {}", e),
                    "Check the host, port, user and database settings",
                )
            })?
            .charset("utf8mb4");

        let mut pool_options = MySqlPoolOptions::new()
            .max_connections(descriptor.max_connections)
            .acquire_timeout(descriptor.connect_timeout);

        if let Some(setup) = descriptor.session_setup() {
            pool_options = pool_options.after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(setup).await?;
                    Ok(())
                })
            });
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                DbError::connection(
                    format!("failed to establish database connection: {}", e),
                    connection_suggestion(&e),
                )
            })?;

        match sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&pool)
            .await
        {
            Ok(version) => {
                debug!(version = %version, "Got server version");
                info!(server_version = %version, "Connected successfully");
            }
            Err(e) => warn!(error = %e, "Failed to get server version"),
        }

        Ok(pool)
    }
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and accessible".to_string();
    }
    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify DB_USER and DB_PASSWORD".to_string();
    }
    if error_str.contains("unknown database") {
        return "Check that DB_NAME names an existing database".to_string();
    }
    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }
    "Verify DB_HOST, DB_PORT and that the server accepts connections".to_string()
}
