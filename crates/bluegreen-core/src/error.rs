//! Error taxonomy for blue/green state operations.
//!
//! Every error is fatal to the invocation; nothing is retried
//! automatically except the bounded table-activation poll inside
//! [`crate::store::TableStore::wait_until_active`].

use thiserror::Error;

/// Result type alias for blue/green state operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required input for the selected action was absent or empty.
    /// Surfaced before any store call.
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid color {0:?}: expected \"blue\" or \"green\"")]
    InvalidColor(String),

    #[error(
        "unknown action {0:?}: expected one of init, get-active, set-active, get-inactive, toggle"
    )]
    UnknownAction(String),

    /// A read-modify operation found no state row for the key.
    #[error("no deployment state found for {0:?}: run the init action first")]
    StateNotFound(String),

    /// The backing store failed for any reason other than "not found"
    /// during an existence check. Carries the underlying message.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Table creation succeeded but the table never reported active
    /// status within the poll budget.
    #[error("table {table:?} did not become active after {attempts} attempts")]
    TableNotReady { table: String, attempts: u32 },
}
