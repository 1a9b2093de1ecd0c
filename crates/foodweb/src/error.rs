//! Error types for the id codec, the stores, and the composition root.
//!
//! Everything here is request-fatal at worst: operations reject with a
//! typed value and the process keeps running. Decode failures of untrusted
//! input travel separately as [`ErrorTree`](crate::decode::ErrorTree)
//! values and surface in stores as `Rejected` variants carrying the
//! flattened report.

use thiserror::Error;

use crate::model::Table;
use crate::report::ReportedError;

/// Error decoding a global id token.
///
/// Each variant carries the offending decoded data for debug-level
/// reporting; the client-facing representation is a generic plain code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The token's surface shape is wrong: empty, oversize, a character
    /// outside the alphabet, or an empty value segment.
    #[error("token shape is invalid: {reason}")]
    InvalidHash { reason: &'static str },

    /// The token decoded, but not to exactly two values.
    #[error("expected 2 encoded values, found {}", .values.len())]
    InvalidLength { values: Vec<u128> },

    /// The table slot decoded to a value outside the integer range.
    #[error("table slot {value} exceeds the integer range")]
    InvalidTableSlot { value: u128 },

    /// The id slot decoded to a value outside the integer range.
    #[error("id slot {value} exceeds the integer range")]
    InvalidIdSlot { value: u128 },

    /// The table slot is a well-formed integer naming no known table.
    #[error("table discriminant {table} is not a known table")]
    UnknownTable { table: u64 },
}

/// Error from an entity table operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The row is out of range or tombstoned.
    #[error("{} row {row} not found", .table.name())]
    NotFound { table: Table, row: u64 },

    /// The input (or a stored row re-checked on read) failed schema
    /// validation.
    #[error("input rejected with {} validation error(s)", .errors.len())]
    Rejected { errors: Vec<ReportedError> },
}

/// Error from the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// No relations were ever recorded for the node.
    #[error("no relations recorded for {token}")]
    NotFound { token: String },

    /// A relationship write referenced an id with no live row.
    #[error("{token} does not reference a live row")]
    MissingNode { token: String },
}

/// Error from the composition root.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    /// The request arguments failed schema validation.
    #[error("input rejected with {} validation error(s)", .errors.len())]
    Rejected { errors: Vec<ReportedError> },

    /// The patch variant does not match the table the id addresses.
    #[error("patch does not target a {} row", .table.name())]
    PatchTableMismatch { table: Table },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl DbError {
    /// The flattened validation report, when this is a rejection.
    pub fn rejection(&self) -> Option<&[ReportedError]> {
        match self {
            DbError::Rejected { errors } | DbError::Store(StoreError::Rejected { errors }) => {
                Some(errors)
            }
            _ => None,
        }
    }
}
