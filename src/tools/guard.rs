//! Intent guard for planner-classified statements.
//!
//! A tool declares which kind of statement it is willing to run. The guard
//! compares that declaration with the `select_type` MySQL's planner reported
//! for the query and refuses to go on when they disagree. No SQL is parsed
//! here: the planner's answer is the only source of truth.

use crate::error::{DbError, DbResult};

/// Statement category a tool declares for the query it is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementCategory {
    /// Skip the plan check entirely (SHOW statements, DDL).
    #[default]
    None,
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementCategory {
    /// Mutation categories, in the order the planner names them.
    pub const MUTATIONS: [StatementCategory; 3] = [Self::Insert, Self::Update, Self::Delete];

    /// The `select_type` MySQL reports for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// True when the guard must consult the planner for this category.
    pub fn requires_plan_check(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for StatementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Outcome of comparing an observed plan type with a declared category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Accepted,
    Rejected,
}

/// Decide whether `observed` satisfies `declared`.
///
/// Mutation categories need an exact, case-sensitive match. `Select` accepts
/// anything that is not one of the mutation names, so `SIMPLE`, `PRIMARY`,
/// `UNION` and the rest all pass. `None` always passes.
///
/// # Examples
///
/// ```
/// use mysql_mcp_server::tools::guard::{decide, GuardDecision, StatementCategory};
///
/// assert_eq!(decide("UPDATE", StatementCategory::Update), GuardDecision::Accepted);
/// assert_eq!(decide("SIMPLE", StatementCategory::Update), GuardDecision::Rejected);
/// assert_eq!(decide("SIMPLE", StatementCategory::Select), GuardDecision::Accepted);
/// assert_eq!(decide("DELETE", StatementCategory::Select), GuardDecision::Rejected);
/// ```
pub fn decide(observed: &str, declared: StatementCategory) -> GuardDecision {
    let accepted = match declared {
        StatementCategory::None => true,
        StatementCategory::Select => !StatementCategory::MUTATIONS
            .iter()
            .any(|m| m.as_str() == observed),
        mutation => observed == mutation.as_str(),
    };

    if accepted {
        GuardDecision::Accepted
    } else {
        GuardDecision::Rejected
    }
}

/// Accept or reject, turning a rejection into [`DbError::Rejected`].
pub fn check(observed: &str, declared: StatementCategory) -> DbResult<()> {
    match decide(observed, declared) {
        GuardDecision::Accepted => Ok(()),
        GuardDecision::Rejected => Err(DbError::rejected(declared.to_string(), observed)),
    }
}
