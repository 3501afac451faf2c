//! Crate-wide error type.
//!
//! All fallible operations in the crate return [`Result`]. Contract
//! violations that indicate programmer error (e.g. selecting from an empty
//! population) panic instead, with a descriptive message.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the symbolic regression core.
#[derive(Debug, Error)]
pub enum Error {
    /// The linear postfix layout is malformed: a node's child walk escapes
    /// the array, or a derived length is inconsistent with the arities.
    #[error("invalid tree: {0}")]
    InvalidTree(String),

    /// A creator cannot satisfy its size constraints with the configured
    /// primitive set (e.g. no leaf symbol is enabled).
    #[error("target length {target} is unreachable with the current primitive set")]
    UnreachableTargetLength { target: usize },

    /// The requested arity window contains no enabled symbol.
    #[error("no symbol available with arity in [{min_arity}, {max_arity}]")]
    NoSymbolAvailable { min_arity: usize, max_arity: usize },

    /// A CSV field could not be parsed as a number.
    #[error("failed to parse field at row {row}, column {column}")]
    ParseError { row: usize, column: usize },

    /// The interpreter's dispatch table has no handler for a node type.
    #[error("no handler registered for node type {0}")]
    InvalidNodeType(&'static str),

    /// The shared evaluation budget reached zero.
    #[error("evaluation budget exhausted")]
    BudgetExhausted,

    /// A mutating operation was attempted on a dataset that does not own
    /// its storage.
    #[error("cannot {operation}: dataset does not own its storage")]
    ViewNotMutable { operation: &'static str },

    /// Low-level CSV reader/writer failure (I/O, malformed record shape).
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
