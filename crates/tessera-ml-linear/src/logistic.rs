use crate::gradient::{GradientDescentConfig, GradientModel, Link, Penalty};
use std::path::Path;
use tessera_ml_core::{DenseMatrix, Float, MatrixResult, Predictor};
use tessera_ml_io::{load_params, save_params, IoResult};

/// Binary logistic regression trained by batch gradient descent.
///
/// Targets are `0.0` / `1.0`. Each call to `fit` restarts from zero weights.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression<T: Float> {
    model: GradientModel<T>,
}

impl<T: Float> LogisticRegression<T> {
    pub fn new(learning_rate: T, lambda: T, penalty: Penalty) -> Self {
        Self::with_config(
            GradientDescentConfig::default()
                .with_learning_rate(learning_rate)
                .with_penalty(penalty, lambda),
        )
    }

    pub fn with_config(config: GradientDescentConfig<T>) -> Self {
        LogisticRegression {
            model: GradientModel::new(config, Link::Logistic),
        }
    }

    pub fn config(&self) -> &GradientDescentConfig<T> {
        &self.model.config
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_fitted()
    }

    pub fn weights(&self) -> Option<&DenseMatrix<T>> {
        self.model.weights()
    }

    pub fn bias(&self) -> Option<T> {
        self.model.bias()
    }

    pub fn fit_epochs(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>, epochs: usize) -> MatrixResult<()> {
        self.model.fit(x, y, epochs)
    }

    /// Probability of the positive class for each row, in `[0, 1]`.
    pub fn predict_proba(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.model.output(x)
    }

    /// Class labels: `1.0` where the probability is at least 0.5, else `0.0`.
    pub fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.map(|p| if p >= T::HALF { T::ONE } else { T::ZERO }))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        save_params(&self.model.to_params()?, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let params = load_params(path)?;
        Ok(LogisticRegression {
            model: GradientModel::from_params(params, Link::Logistic)?,
        })
    }
}

impl<T: Float> Default for LogisticRegression<T> {
    fn default() -> Self {
        Self::with_config(GradientDescentConfig::default())
    }
}

impl<T: Float> Predictor<T> for LogisticRegression<T> {
    fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>) -> MatrixResult<()> {
        let epochs = self.model.config.epochs;
        self.model.fit(x, y, epochs)
    }

    fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        LogisticRegression::predict(self, x)
    }
}
