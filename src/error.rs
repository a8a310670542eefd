//! Error types shared by every transformation

use thiserror::Error;

/// Failure modes of the reshaping operations.
///
/// Every error is reported synchronously before any output table is produced;
/// no operation returns a partially transformed table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Both a keep strategy and an aggregator were handed to a column merge.
    #[error("parameters keep and aggregator cannot be used at the same time, use only one")]
    ConflictingMergeStrategy,

    /// Neither a keep strategy nor an aggregator was handed to a column merge.
    #[error("a column merge needs either a keep strategy or an aggregator")]
    MissingMergeStrategy,

    /// A keep strategy string other than `first` or `last`.
    #[error("improper value for keep: {0:?} (possible values: first, last)")]
    InvalidKeep(String),

    /// None of the requested columns exist in the table.
    #[error("none of the following columns were found: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A column that must be present is absent.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Source and result column lists differ in length.
    #[error("result columns must match columns in length ({columns} != {result_columns})")]
    ArityMismatch {
        columns: usize,
        result_columns: usize,
    },

    /// Too few columns were handed to the lockstep expander.
    #[error("columns argument must contain at least one item, got {0}")]
    TooFewColumns(usize),

    /// The same label occurs more than once, or an operation would create it twice.
    #[error("duplicated columns: {}", .0.join(", "))]
    DuplicateColumns(Vec<String>),

    /// Two rows share one hierarchy key.
    #[error("duplicated hierarchy key: {0}")]
    DuplicateKey(String),

    /// The parent relation loops back on itself.
    #[error("cyclic parent relation reached from key {key}")]
    CyclicHierarchy { key: String },

    /// Ancestor chains are still open after the caller's generation bound.
    #[error("ancestor chain still open after {limit} generations")]
    GenerationLimitExceeded { limit: usize },

    /// A conversion kind name that is not recognised.
    #[error("unknown conversion: {0:?}")]
    UnknownConversion(String),

    /// A time unit name that is not recognised.
    #[error("unknown time unit: {0:?} (possible values: s, ms, us, ns)")]
    UnknownTimeUnit(String),

    /// A row was built with the wrong number of cells or index components.
    #[error("row has {found} values, expected {expected}")]
    RowArity { expected: usize, found: usize },

    /// Input that cannot be read as a list of records.
    #[error("invalid records: {0}")]
    InvalidRecords(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
