use crate::layers::{Layer, LayerCache};
use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult, Predictor};

/// Feed-forward stack of layers trained with mean squared error.
///
/// Layers run in insertion order on the forward pass and in reverse on the
/// backward pass. Each layer updates its own parameters while the gradient
/// flows through it.
#[derive(Debug)]
pub struct LayeredNetwork<T: Float> {
    layers: Vec<Box<dyn Layer<T>>>,
    learning_rate: T,
    epochs: usize,
}

impl<T: Float> LayeredNetwork<T> {
    pub fn new(learning_rate: T) -> Self {
        LayeredNetwork {
            layers: Vec::new(),
            learning_rate,
            epochs: 100,
        }
    }

    /// Epochs used by `Predictor::fit`.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_layer<L: Layer<T> + 'static>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    pub fn push(&mut self, layer: Box<dyn Layer<T>>) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn learning_rate(&self) -> T {
        self.learning_rate
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    /// Run `x` through every layer. An empty network returns `x` unchanged.
    pub fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.infer(&out)?;
        }
        Ok(out)
    }

    fn forward_with_caches(&self, x: &DenseMatrix<T>) -> MatrixResult<(DenseMatrix<T>, Vec<LayerCache<T>>)> {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut out: Option<DenseMatrix<T>> = None;
        for layer in &self.layers {
            let input = out.as_ref().unwrap_or(x);
            let (next, cache) = layer.forward(input)?;
            caches.push(cache);
            out = Some(next);
        }
        let out = out.ok_or_else(|| MatrixError::InvalidArgument("network has no layers".into()))?;
        Ok((out, caches))
    }

    fn mse(output: &DenseMatrix<T>, y: &DenseMatrix<T>) -> f64 {
        let n = output.len().max(1) as f64;
        output
            .as_slice()
            .iter()
            .zip(y.as_slice())
            .map(|(&o, &t)| {
                let d = (o - t).to_f64();
                d * d
            })
            .sum::<f64>()
            / n
    }

    /// Train for exactly `epochs` full-batch passes over `(x, y)`.
    ///
    /// The loss gradient fed to the last layer is `(output - y) * 2 / rows`.
    pub fn fit_epochs(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>, epochs: usize) -> MatrixResult<()> {
        if self.layers.is_empty() {
            return Err(MatrixError::InvalidArgument("network has no layers".into()));
        }
        if x.rows() != y.rows() {
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

        let grad_scale = T::TWO / T::from_usize(x.rows());
        for epoch in 0..epochs {
            let (output, caches) = self.forward_with_caches(x)?;
            if output.shape() != y.shape() {
                return Err(MatrixError::DimensionMismatch {
                    op: "loss",
                    left: output.shape(),
                    right: y.shape(),
                });
            }
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("epoch {}/{}: mse = {:.6}", epoch + 1, epochs, Self::mse(&output, y));
            }

            let mut grad = output.sub(y)?.scale(grad_scale);
            for (layer, cache) in self.layers.iter_mut().rev().zip(caches.iter().rev()) {
                grad = layer.backward(cache, &grad, self.learning_rate)?;
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let output = self.predict(x)?;
            log::debug!(
                "network of {} layers ({} parameters) trained for {} epochs: mse = {:.6}",
                self.layers.len(),
                self.parameter_count(),
                epochs,
                Self::mse(&output, y)
            );
        }
        Ok(())
    }
}

impl<T: Float> Predictor<T> for LayeredNetwork<T> {
    fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>) -> MatrixResult<()> {
        let epochs = self.epochs;
        self.fit_epochs(x, y, epochs)
    }

    fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        LayeredNetwork::predict(self, x)
    }
}
