use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult};
use tessera_ml_io::{IoError, IoResult, ModelParams};

/// Weight regularization applied during gradient descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    #[default]
    None,
    /// Adds `lambda * sign(w)` to each weight gradient.
    L1,
    /// Adds `lambda * w` to each weight gradient.
    L2,
}

impl Penalty {
    #[inline]
    fn term<T: Float>(self, lambda: T, w: T) -> T {
        match self {
            Penalty::None => T::ZERO,
            Penalty::L1 => lambda * w.sign(),
            Penalty::L2 => lambda * w,
        }
    }
}

impl FromStr for Penalty {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Penalty::None),
            "l1" => Ok(Penalty::L1),
            "l2" => Ok(Penalty::L2),
            other => Err(MatrixError::InvalidArgument(format!(
                "unknown penalty '{}', expected none, l1 or l2",
                other
            ))),
        }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::None => write!(f, "none"),
            Penalty::L1 => write!(f, "l1"),
            Penalty::L2 => write!(f, "l2"),
        }
    }
}

/// Hyperparameters shared by the gradient-descent models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct GradientDescentConfig<T: Float> {
    pub learning_rate: T,
    pub lambda: T,
    pub penalty: Penalty,
    /// Epochs used by `Predictor::fit`.
    pub epochs: usize,
}

impl<T: Float> Default for GradientDescentConfig<T> {
    fn default() -> Self {
        GradientDescentConfig {
            learning_rate: T::from_f64(0.01),
            lambda: T::from_f64(0.01),
            penalty: Penalty::None,
            epochs: 100,
        }
    }
}

impl<T: Float> GradientDescentConfig<T> {
    pub fn with_learning_rate(mut self, learning_rate: T) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_penalty(mut self, penalty: Penalty, lambda: T) -> Self {
        self.penalty = penalty;
        self.lambda = lambda;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }
}

/// Output transform applied to the affine score `Xw + b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Identity,
    Logistic,
}

impl Link {
    fn apply<T: Float>(self, z: DenseMatrix<T>) -> DenseMatrix<T> {
        match self {
            Link::Identity => z,
            Link::Logistic => z.map(|v| T::ONE / (T::ONE + (-v).exp())),
        }
    }

    /// Mean squared error for the identity link, binary cross-entropy otherwise.
    fn loss<T: Float>(self, predictions: &DenseMatrix<T>, targets: &DenseMatrix<T>) -> f64 {
        let n = predictions.len().max(1) as f64;
        let pairs = predictions.as_slice().iter().zip(targets.as_slice());
        match self {
            Link::Identity => {
                pairs
                    .map(|(&p, &t)| {
                        let d = (p - t).to_f64();
                        d * d
                    })
                    .sum::<f64>()
                    / n
            }
            Link::Logistic => {
                let eps = 1e-15;
                pairs
                    .map(|(&p, &t)| {
                        let (p, t) = (p.to_f64(), t.to_f64());
                        -(t * (p + eps).ln() + (1.0 - t) * (1.0 - p + eps).ln())
                    })
                    .sum::<f64>()
                    / n
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Fitted<T: Float> {
    weights: DenseMatrix<T>,
    bias: T,
}

/// Batch gradient descent over a `(features, 1)` weight column and a scalar
/// bias. Linear and logistic regression differ only in their [`Link`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradientModel<T: Float> {
    pub(crate) config: GradientDescentConfig<T>,
    link: Link,
    fitted: Option<Fitted<T>>,
}

impl<T: Float> GradientModel<T> {
    pub(crate) fn new(config: GradientDescentConfig<T>, link: Link) -> Self {
        GradientModel {
            config,
            link,
            fitted: None,
        }
    }

    pub(crate) fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub(crate) fn weights(&self) -> Option<&DenseMatrix<T>> {
        self.fitted.as_ref().map(|f| &f.weights)
    }

    pub(crate) fn bias(&self) -> Option<T> {
        self.fitted.as_ref().map(|f| f.bias)
    }

    /// Train from zero-initialized parameters for exactly `epochs` passes.
    pub(crate) fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>, epochs: usize) -> MatrixResult<()> {
        if y.rows() != x.rows() || y.cols() != 1 {
            return Err(MatrixError::DimensionMismatch {
                op: "fit",
                left: x.shape(),
                right: y.shape(),
            });
        }
        if x.is_empty() {
            return Err(MatrixError::InvalidArgument(
                "cannot fit on an empty feature matrix".into(),
            ));
        }

        let GradientDescentConfig {
            learning_rate,
            lambda,
            penalty,
            ..
        } = self.config;
        let step = learning_rate / T::from_usize(x.rows());
        let xt = x.transpose();

        let mut weights = DenseMatrix::zeros(x.cols(), 1);
        let mut bias = T::ZERO;

        for epoch in 0..epochs {
            let predictions = self.link.apply(x.matmul(&weights)?.add_scalar(bias));
            let error = predictions.sub(y)?;

            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "epoch {}/{}: loss = {:.6}",
                    epoch + 1,
                    epochs,
                    self.link.loss(&predictions, y)
                );
            }

            let grad = xt.matmul(&error)?;
            for (w, &g) in weights.as_mut_slice().iter_mut().zip(grad.as_slice()) {
                let reg = penalty.term(lambda, *w);
                *w -= step * (g + reg);
            }
            bias -= step * error.sum();
        }

        if log::log_enabled!(log::Level::Debug) {
            let predictions = self.link.apply(x.matmul(&weights)?.add_scalar(bias));
            log::debug!(
                "{:?} model fitted on {}x{} after {} epochs (lr = {}, penalty = {}): loss = {:.6}",
                self.link,
                x.rows(),
                x.cols(),
                epochs,
                learning_rate,
                penalty,
                self.link.loss(&predictions, y)
            );
        }

        self.fitted = Some(Fitted { weights, bias });
        Ok(())
    }

    /// `link(Xw + b)` for every row of `x`.
    pub(crate) fn output(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let fitted = self.fitted.as_ref().ok_or(MatrixError::NotFitted)?;
        if x.cols() != fitted.weights.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "predict",
                left: x.shape(),
                right: fitted.weights.shape(),
            });
        }
        let z = x.matmul(&fitted.weights)?.add_scalar(fitted.bias);
        Ok(self.link.apply(z))
    }

    pub(crate) fn to_params(&self) -> IoResult<ModelParams<T>> {
        let fitted = self.fitted.as_ref().ok_or(IoError::NotFitted)?;
        Ok(ModelParams {
            learning_rate: self.config.learning_rate,
            weights: fitted.weights.clone(),
            bias: DenseMatrix::filled(1, 1, fitted.bias),
        })
    }

    /// Rebuild a fitted model from persisted parameters. Regularization and
    /// epoch settings are not persisted and take their defaults.
    pub(crate) fn from_params(params: ModelParams<T>, link: Link) -> IoResult<Self> {
        if params.weights.cols() != 1 || params.weights.is_empty() {
            return Err(IoError::Parse {
                field: "weight dimensions",
                value: format!("{} {}", params.weights.rows(), params.weights.cols()),
            });
        }
        if params.bias.shape() != (1, 1) {
            return Err(IoError::Parse {
                field: "bias dimensions",
                value: format!("{} {}", params.bias.rows(), params.bias.cols()),
            });
        }
        let bias = params.bias.get(0, 0)?;
        let config = GradientDescentConfig::default().with_learning_rate(params.learning_rate);
        Ok(GradientModel {
            config,
            link,
            fitted: Some(Fitted {
                weights: params.weights,
                bias,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_penalty_from_str() {
        assert_eq!("none".parse::<Penalty>().unwrap(), Penalty::None);
        assert_eq!("L1".parse::<Penalty>().unwrap(), Penalty::L1);
        assert_eq!("l2".parse::<Penalty>().unwrap(), Penalty::L2);
        assert!("elastic".parse::<Penalty>().is_err());
        assert_eq!(Penalty::L2.to_string(), "l2");
    }

    #[test]
    fn test_penalty_terms() {
        assert_eq!(Penalty::None.term(0.5, 3.0), 0.0);
        assert_eq!(Penalty::L2.term(0.5, 3.0), 1.5);
        assert_eq!(Penalty::L1.term(0.5, -3.0), -0.5);
        assert_eq!(Penalty::L1.term(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_config_defaults_and_json() {
        let config = GradientDescentConfig::<f64>::default();
        assert_eq!(config.epochs, 100);
        assert_eq!(config.penalty, Penalty::None);

        let tuned = config.with_penalty(Penalty::L1, 0.2).with_epochs(500);
        let json = serde_json::to_string(&tuned).unwrap();
        assert!(json.contains("\"penalty\":\"l1\""));
        let back: GradientDescentConfig<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tuned);
    }

    #[test]
    fn test_single_epoch_update() {
        // x = [1, 2], y = [1, 2], lr = 0.5, zero start:
        // error = [-1, -2], gradW = -5, step = 0.25 -> w = 1.25, b = 0.75
        let x = DenseMatrix::column_vector(&[1.0, 2.0]);
        let y = DenseMatrix::column_vector(&[1.0, 2.0]);
        let config = GradientDescentConfig::default().with_learning_rate(0.5);
        let mut model = GradientModel::new(config, Link::Identity);
        model.fit(&x, &y, 1).unwrap();
        assert_abs_diff_eq!(model.weights().unwrap().get(0, 0).unwrap(), 1.25);
        assert_abs_diff_eq!(model.bias().unwrap(), 0.75);
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let x = DenseMatrix::column_vector(&[1.0, 2.0, 3.0, 4.0]);
        let y = DenseMatrix::column_vector(&[2.0, 4.0, 6.0, 8.0]);
        let base = GradientDescentConfig::default().with_learning_rate(0.05);

        let mut plain = GradientModel::new(base, Link::Identity);
        plain.fit(&x, &y, 500).unwrap();
        let mut ridge = GradientModel::new(base.with_penalty(Penalty::L2, 5.0), Link::Identity);
        ridge.fit(&x, &y, 500).unwrap();

        let w_plain = plain.weights().unwrap().get(0, 0).unwrap();
        let w_ridge = ridge.weights().unwrap().get(0, 0).unwrap();
        assert!(w_ridge.abs() < w_plain.abs());
    }

    #[test]
    fn test_fit_rejects_bad_targets() {
        let x = DenseMatrix::<f64>::zeros(3, 2);
        let y = DenseMatrix::zeros(2, 1);
        let mut model = GradientModel::new(GradientDescentConfig::default(), Link::Identity);
        assert!(matches!(
            model.fit(&x, &y, 1),
            Err(MatrixError::DimensionMismatch { op: "fit", .. })
        ));
        assert!(model
            .fit(&DenseMatrix::zeros(0, 2), &DenseMatrix::zeros(0, 1), 1)
            .is_err());
    }

    #[test]
    fn test_zero_epochs_leaves_zero_parameters() {
        let x = DenseMatrix::column_vector(&[1.0, 2.0]);
        let y = DenseMatrix::column_vector(&[3.0, 5.0]);
        let mut model = GradientModel::new(GradientDescentConfig::default(), Link::Logistic);
        model.fit(&x, &y, 0).unwrap();
        assert_eq!(model.weights().unwrap().as_slice(), &[0.0]);
        let p = model.output(&x).unwrap();
        assert_eq!(p.as_slice(), &[0.5, 0.5]);
    }
}
