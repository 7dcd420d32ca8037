//! Error types for race timing operations.
//!
//! Every command either succeeds with its documented write or fails without
//! mutating anything. The error says which of the failure classes occurred so a
//! caller can decide what to tell the operator.
//!
//! ## Error Categories
//!
//! - **Validation**: malformed input such as a manual time string or an out of range hit count
//! - **Not Found**: an event, race or competitor id that does not resolve
//! - **Conflict**: a write precondition no longer holds (the record changed underneath)
//! - **Transaction**: the storage collaborator failed a write group, which was rolled back
//! - **Parse**: interchange documents or configuration that cannot be decoded
//! - **Unsupported**: an operation that does not apply to the event's race mode
//!
//! ## Recovery
//!
//! Nothing in the core retries automatically. Errors report whether retrying the
//! same user action can succeed:
//!
//! ```rust
//! use firingline::RaceError;
//!
//! let error = RaceError::conflict("race", "42", "splits changed");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type alias for race timing operations.
pub type Result<T, E = RaceError> = std::result::Result<T, E>;

/// Main error type for race timing operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RaceError {
    #[error("Invalid {field}: {details}")]
    Validation { field: String, details: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Write conflict on {entity} {id}: {reason}")]
    Conflict { entity: &'static str, id: String, reason: String },

    #[error("Transaction failed: {reason}")]
    Transaction {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("{operation} is not available for {mode} events")]
    Unsupported { operation: String, mode: String },
}

impl RaceError {
    /// Returns whether repeating the same user action may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RaceError::Conflict { .. } => true,
            RaceError::Transaction { .. } => true,
            RaceError::Validation { .. } => false,
            RaceError::NotFound { .. } => false,
            RaceError::Parse { .. } => false,
            RaceError::Unsupported { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RaceError::Validation { .. } => vec![
                "Correct the highlighted value and submit again",
                "Times use minutes:seconds.tenths or seconds.tenths",
                "Hit counts range from 0 to 5",
            ],
            RaceError::NotFound { .. } => vec![
                "Refresh the event view",
                "Check the record was not deleted from another screen",
            ],
            RaceError::Conflict { .. } => vec![
                "Refresh the race and repeat the action",
                "Check whether the auto-start already recorded this checkpoint",
            ],
            RaceError::Transaction { .. } => vec![
                "Repeat the action, no partial changes were kept",
                "Check the storage backend is reachable",
            ],
            RaceError::Parse { .. } => vec![
                "Verify the file is an unmodified export",
                "Check the document contains competitors, events and races",
            ],
            RaceError::Unsupported { .. } => vec![
                "Use a pursuit or relay event for master-clock starts",
                "Check the event's race mode",
            ],
        }
    }

    /// Helper constructor for validation failures.
    pub fn validation(field: impl Into<String>, details: impl Into<String>) -> Self {
        RaceError::Validation { field: field.into(), details: details.into() }
    }

    /// Helper constructor for unresolved references.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RaceError::NotFound { entity, id: id.to_string() }
    }

    /// Helper constructor for failed write preconditions.
    pub fn conflict(entity: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        RaceError::Conflict { entity, id: id.to_string(), reason: reason.into() }
    }

    /// Helper constructor for failed write groups.
    pub fn transaction_failed(reason: impl Into<String>) -> Self {
        RaceError::Transaction { reason: reason.into(), source: None }
    }

    /// Helper constructor for failed write groups with source.
    pub fn transaction_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        RaceError::Transaction { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for mode-specific operations.
    pub fn unsupported(operation: impl Into<String>, mode: impl ToString) -> Self {
        RaceError::Unsupported { operation: operation.into(), mode: mode.to_string() }
    }
}

impl From<serde_json::Error> for RaceError {
    fn from(err: serde_json::Error) -> Self {
        RaceError::Parse { context: "interchange document".to_string(), details: err.to_string() }
    }
}
