pub mod classification;
pub mod regression;

pub use classification::*;
pub use regression::*;

use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult};

/// Pair up the elements of two equally shaped, non-empty target vectors.
pub(crate) fn paired<'a, T: Float>(
    op: &'static str,
    y_true: &'a DenseMatrix<T>,
    y_pred: &'a DenseMatrix<T>,
) -> MatrixResult<impl Iterator<Item = (T, T)> + 'a> {
    if y_true.shape() != y_pred.shape() {
        return Err(MatrixError::DimensionMismatch {
            op,
            left: y_true.shape(),
            right: y_pred.shape(),
        });
    }
    if y_true.is_empty() {
        return Err(MatrixError::InvalidArgument(format!("{}: no samples", op)));
    }
    Ok(y_true
        .as_slice()
        .iter()
        .copied()
        .zip(y_pred.as_slice().iter().copied()))
}
