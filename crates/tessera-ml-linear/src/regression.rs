use crate::gradient::{GradientDescentConfig, GradientModel, Link, Penalty};
use std::path::Path;
use tessera_ml_core::{DenseMatrix, Float, MatrixResult, Predictor};
use tessera_ml_io::{load_params, save_params, IoResult};

/// Linear regression trained by batch gradient descent.
///
/// Predicts `Xw + b`. Each call to `fit` restarts from zero weights.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression<T: Float> {
    model: GradientModel<T>,
}

impl<T: Float> LinearRegression<T> {
    pub fn new(learning_rate: T, lambda: T, penalty: Penalty) -> Self {
        Self::with_config(
            GradientDescentConfig::default()
                .with_learning_rate(learning_rate)
                .with_penalty(penalty, lambda),
        )
    }

    pub fn with_config(config: GradientDescentConfig<T>) -> Self {
        LinearRegression {
            model: GradientModel::new(config, Link::Identity),
        }
    }

    pub fn config(&self) -> &GradientDescentConfig<T> {
        &self.model.config
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_fitted()
    }

    /// Learned `(features, 1)` weight column, once fitted.
    pub fn weights(&self) -> Option<&DenseMatrix<T>> {
        self.model.weights()
    }

    pub fn bias(&self) -> Option<T> {
        self.model.bias()
    }

    /// Train for exactly `epochs` passes over `(x, y)`.
    pub fn fit_epochs(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>, epochs: usize) -> MatrixResult<()> {
        self.model.fit(x, y, epochs)
    }

    pub fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.model.output(x)
    }

    /// Persist learning rate, weights and bias in the text model format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        save_params(&self.model.to_params()?, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let params = load_params(path)?;
        Ok(LinearRegression {
            model: GradientModel::from_params(params, Link::Identity)?,
        })
    }
}

impl<T: Float> Default for LinearRegression<T> {
    fn default() -> Self {
        Self::with_config(GradientDescentConfig::default())
    }
}

impl<T: Float> Predictor<T> for LinearRegression<T> {
    fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>) -> MatrixResult<()> {
        let epochs = self.model.config.epochs;
        self.model.fit(x, y, epochs)
    }

    fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.model.output(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::NamedTempFile;
    use tessera_ml_core::MatrixError;
    use tessera_ml_io::IoError;

    fn line_data() -> (DenseMatrix<f64>, DenseMatrix<f64>) {
        // y = 2x + 1
        let xs: Vec<f64> = (0..10).map(|i| i as f64 / 10.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        (DenseMatrix::column_vector(&xs), DenseMatrix::column_vector(&ys))
    }

    #[test]
    fn test_learns_line() {
        let (x, y) = line_data();
        let mut model = LinearRegression::new(0.1, 0.0, Penalty::None);
        model.fit_epochs(&x, &y, 5000).unwrap();
        assert_abs_diff_eq!(model.weights().unwrap().get(0, 0).unwrap(), 2.0, epsilon = 0.05);
        assert_abs_diff_eq!(model.bias().unwrap(), 1.0, epsilon = 0.05);

        let pred = model.predict(&DenseMatrix::column_vector(&[0.5])).unwrap();
        assert_abs_diff_eq!(pred.get(0, 0).unwrap(), 2.0, epsilon = 0.05);
    }

    #[test]
    fn test_refit_restarts_from_zero() {
        let (x, y) = line_data();
        let mut once = LinearRegression::new(0.1, 0.0, Penalty::None);
        once.fit_epochs(&x, &y, 50).unwrap();

        let mut twice = LinearRegression::new(0.1, 0.0, Penalty::None);
        twice.fit_epochs(&x, &y, 50).unwrap();
        twice.fit_epochs(&x, &y, 50).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::<f64>::default();
        assert!(!model.is_fitted());
        assert_eq!(
            model.predict(&DenseMatrix::zeros(1, 1)).unwrap_err(),
            MatrixError::NotFitted
        );
    }

    #[test]
    fn test_zero_feature_columns_rejected() {
        let x = DenseMatrix::<f64>::zeros(3, 0);
        let y = DenseMatrix::column_vector(&[1.0, 2.0, 3.0]);
        let mut model = LinearRegression::default();
        assert!(matches!(
            model.fit_epochs(&x, &y, 10),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(!model.is_fitted());

        let file = NamedTempFile::new().unwrap();
        assert!(matches!(model.save(file.path()), Err(IoError::NotFitted)));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let (x, y) = line_data();
        let mut model = LinearRegression::default();
        Predictor::fit(&mut model, &x, &y).unwrap();
        assert!(matches!(
            model.predict(&DenseMatrix::zeros(2, 3)),
            Err(MatrixError::DimensionMismatch { op: "predict", .. })
        ));
    }

    #[test]
    fn test_save_load_reproduces_predictions() {
        let (x, y) = line_data();
        let mut model = LinearRegression::new(0.05, 0.01, Penalty::L2);
        model.fit_epochs(&x, &y, 300).unwrap();

        let file = NamedTempFile::new().unwrap();
        model.save(file.path()).unwrap();
        let loaded = LinearRegression::<f64>::load(file.path()).unwrap();

        assert_eq!(loaded.config().learning_rate, 0.05);
        assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_save_before_fit() {
        let file = NamedTempFile::new().unwrap();
        let model = LinearRegression::<f64>::default();
        assert!(matches!(model.save(file.path()), Err(IoError::NotFitted)));
    }
}
