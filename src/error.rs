use thiserror::Error;

/// Errors raised by the analytical core.
///
/// Only the structural variants (`UnknownColumn`, `UntypedColumn`,
/// `DuplicateColumn`, `RaggedColumn`, `RaggedRow`, `InvalidConfig`) ever reach a caller.
/// `ParseFailure` and `NoObservations` describe why a single column or
/// predicate was skipped; the pipeline logs them and carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("column '{0}' is not present in the dataset")]
    UnknownColumn(String),

    #[error("column '{0}' has no entry in the type map")]
    UntypedColumn(String),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} values but the dataset has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row} has {found} cells but there are {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("could not parse '{value}' in column '{column}' as {expected}")]
    ParseFailure {
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("column '{0}' has no non-missing values")]
    NoObservations(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
