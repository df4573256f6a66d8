use thiserror::Error;

/// Error type for matrix operations and the predictors built on them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatrixError {
    #[error("Dimension mismatch in {op}: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Index out of bounds: index {index} for axis {axis} with size {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid range {start}..{end} for axis {axis} with size {size}")]
    InvalidRange {
        start: usize,
        end: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Model not fitted: call fit() before predict()")]
    NotFitted,
}

pub type MatrixResult<T> = Result<T, MatrixError>;
