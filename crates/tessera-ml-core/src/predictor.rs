use crate::dtype::Float;
use crate::error::MatrixResult;
use crate::matrix::DenseMatrix;

/// Supervised model: learn from `(features, targets)`, then map features to
/// predictions.
///
/// `features` is `(samples, features)`; `targets` and the returned
/// predictions are `(samples, 1)` column vectors.
pub trait Predictor<T: Float> {
    fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>) -> MatrixResult<()>;
    fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>>;
}

/// Unsupervised feature transform (scalers and the like).
pub trait Transformer<T: Float> {
    fn fit(&mut self, x: &DenseMatrix<T>) -> MatrixResult<()>;
    fn transform(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>>;
    fn fit_transform(&mut self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.fit(x)?;
        self.transform(x)
    }
}
