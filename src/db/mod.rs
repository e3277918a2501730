//! Database layer.
//!
//! This module provides database access functionality:
//! - Lazily opened connection handle
//! - Plan classification through `EXPLAIN`
//! - Guarded query execution
//! - MySQL value decoding

pub mod backend;
pub mod connection;
pub mod executor;
pub mod plan;
pub mod types;

pub use backend::SqlBackend;
pub use connection::{ConnectionDescriptor, Database};
pub use executor::{CallContext, QueryExecutor};
pub use plan::{PlanRow, classify_plan_rows};
pub use types::{ExecOutcome, ResultSet, SqlRow, SqlValue};
