//! Error types shared across the crate.

use thiserror::Error as ThisError;

/// Errors produced by segmentation, smoothing, and aggregation.
///
/// Every fallible operation in this crate is all-or-nothing: on error no
/// partial output is returned, so callers never observe a `GroupId` column
/// paired with thresholds it was not produced with.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// A precondition on the inputs was violated before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A smoothing window or aggregation column contained a NaN or infinite
    /// value. Surfaced immediately rather than coerced, since a poisoned
    /// estimate would corrupt every subsequent threshold.
    #[error("non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the offending value within the sequence handed to
        /// the failing operation.
        index: usize,
    },
}
