use tessera_ml_core::MatrixError;
use thiserror::Error;

/// Errors raised by [`DataFrame`](crate::DataFrame) operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column already exists: {0}")]
    DuplicateColumn(String),

    #[error("Column length mismatch: expected {expected} rows, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Row index {index} out of bounds for {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },

    #[error("Column index {index} out of bounds for {cols} columns")]
    ColumnOutOfBounds { index: usize, cols: usize },

    #[error("Binary encoding of '{column}' needs exactly 2 categories, found {found}")]
    CategoryCount { column: String, found: usize },

    #[error("Unexpected value in binary encoding of '{column}': {value}")]
    UnexpectedCategory { column: String, value: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

pub type DataResult<T> = Result<T, DataError>;
