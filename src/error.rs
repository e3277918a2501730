//! Error types for the MySQL MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every variant renders as a human-readable message, since tool failures are
//! reported back to the calling agent as text rather than as protocol errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Unable to check query plan, denied: expected exactly one plan row, got {rows}")]
    PlanAmbiguity { rows: usize },

    #[error(
        "Query plan does not match expected pattern, denied: declared {declared}, planner reported {observed}"
    )]
    Rejected { declared: String, observed: String },

    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// e.g., "42000" for a syntax error
        sql_state: Option<String>,
    },

    #[error("Key '{column}' not found in result row")]
    MissingField { column: String },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Timeout: {operation} exceeded {limit:?}")]
    Timeout {
        operation: String,
        limit: std::time::Duration,
    },

    #[error("Cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn plan_ambiguity(rows: usize) -> Self {
        Self::PlanAmbiguity { rows }
    }

    pub fn rejected(declared: impl Into<String>, observed: impl Into<String>) -> Self {
        Self::Rejected {
            declared: declared.into(),
            observed: observed.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    pub fn missing_field(column: impl Into<String>) -> Self {
        Self::MissingField {
            column: column.into(),
        }
    }

    /// Create a permission error.
    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, limit: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit,
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Rejected { .. } => {
                Some("Use the tool that matches the statement type, or correct the query")
            }
            Self::PlanAmbiguity { .. } => {
                Some("Simplify the query so the planner reports a single plan row")
            }
            _ => None,
        }
    }

    /// True for failures raised by the plan check, before any real execution.
    pub fn is_guard_failure(&self) -> bool {
        matches!(self, Self::PlanAmbiguity { .. } | Self::Rejected { .. })
    }

    /// Render the error for a tool result, appending the suggestion when there is one.
    pub fn to_tool_message(&self) -> String {
        let base = match self {
            Self::Execution {
                message,
                sql_state: Some(code),
            } => format!("Execution failed: {} (SQLSTATE: {})", message, code),
            _ => self.to_string(),
        };
        match self.suggestion() {
            Some(s) => format!("{}. {}", base, s),
            None => base,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::execution("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a database connection",
                "Check that the MySQL server is reachable and not overloaded",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_plan_ambiguity_display() {
        let err = DbError::plan_ambiguity(3);
        assert!(err.to_string().contains("Unable to check query plan"));
        assert!(err.to_string().contains("got 3"));
    }

    #[test]
    fn test_rejected_names_both_sides() {
        let err = DbError::rejected("UPDATE", "SIMPLE");
        let msg = err.to_string();
        assert!(msg.contains("declared UPDATE"));
        assert!(msg.contains("planner reported SIMPLE"));
    }

    #[test]
    fn test_guard_failures() {
        assert!(DbError::plan_ambiguity(0).is_guard_failure());
        assert!(DbError::rejected("DELETE", "INSERT").is_guard_failure());
        assert!(!DbError::execution("syntax error", None).is_guard_failure());
        assert!(!DbError::missing_field("a").is_guard_failure());
    }

    #[test]
    fn test_missing_field_display() {
        let err = DbError::missing_field("email");
        assert_eq!(err.to_string(), "Key 'email' not found in result row");
    }

    #[test]
    fn test_tool_message_includes_sql_state() {
        let err = DbError::execution("You have an error in your SQL syntax", Some("42000".into()));
        assert!(err.to_tool_message().contains("SQLSTATE: 42000"));
    }

    #[test]
    fn test_tool_message_includes_suggestion() {
        let err = DbError::connection("refused", "Check that the MySQL server is running");
        let msg = err.to_tool_message();
        assert!(msg.starts_with("Connection failed: refused"));
        assert!(msg.ends_with("Check that the MySQL server is running"));
    }

    #[test]
    fn test_not_found_is_verbatim() {
        let err = DbError::not_found("table users does not exist");
        assert_eq!(err.to_string(), "table users does not exist");
        assert_eq!(err.to_tool_message(), "table users does not exist");
    }

    #[test]
    fn test_timeout_and_cancel_display() {
        assert_eq!(
            DbError::timeout("EXPLAIN", Duration::from_secs(30)).to_string(),
            "Timeout: EXPLAIN exceeded 30s"
        );
        assert_eq!(
            DbError::timeout("plan check", Duration::from_millis(250)).to_string(),
            "Timeout: plan check exceeded 250ms"
        );
        assert_eq!(
            DbError::cancelled("query execution").to_string(),
            "Cancelled: query execution"
        );
    }
}
