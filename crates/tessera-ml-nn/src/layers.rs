use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult};

/// What a layer remembers from `forward` for the matching `backward` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCache<T: Float> {
    input: DenseMatrix<T>,
}

impl<T: Float> LayerCache<T> {
    pub fn new(input: DenseMatrix<T>) -> Self {
        LayerCache { input }
    }

    /// The batch the layer saw on the forward pass.
    pub fn input(&self) -> &DenseMatrix<T> {
        &self.input
    }
}

/// One stage of a [`LayeredNetwork`](crate::LayeredNetwork).
///
/// `forward` is pure and hands back a cache; `backward` consumes that cache,
/// applies the layer's own parameter update and returns the gradient with
/// respect to the layer input.
pub trait Layer<T: Float>: fmt::Debug {
    fn forward(&self, input: &DenseMatrix<T>) -> MatrixResult<(DenseMatrix<T>, LayerCache<T>)>;

    fn backward(
        &mut self,
        cache: &LayerCache<T>,
        output_grad: &DenseMatrix<T>,
        learning_rate: T,
    ) -> MatrixResult<DenseMatrix<T>>;

    /// Forward pass without building a cache.
    fn infer(&self, input: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        Ok(self.forward(input)?.0)
    }

    /// Number of trainable scalars.
    fn parameter_count(&self) -> usize {
        0
    }
}

// ─── Dense ──────────────────────────────────────────────────────────────────

/// Fully connected layer: `y = xW + b`.
///
/// `W` is `(inputs, outputs)` and `b` is a `(1, outputs)` row broadcast over
/// the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DenseLayer<T: Float> {
    weights: DenseMatrix<T>,
    bias: DenseMatrix<T>,
}

impl<T: Float> DenseLayer<T> {
    /// He initialization: weights drawn from `N(0, sqrt(2 / inputs))`, zero bias.
    pub fn new<R: Rng>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let std_dev = (T::TWO / T::from_usize(input_size.max(1))).sqrt();
        DenseLayer {
            weights: DenseMatrix::randn(input_size, output_size, T::ZERO, std_dev, rng),
            bias: DenseMatrix::zeros(1, output_size),
        }
    }

    pub fn from_parameters(weights: DenseMatrix<T>, bias: DenseMatrix<T>) -> MatrixResult<Self> {
        if bias.shape() != (1, weights.cols()) {
            return Err(MatrixError::DimensionMismatch {
                op: "dense bias",
                left: weights.shape(),
                right: bias.shape(),
            });
        }
        Ok(DenseLayer { weights, bias })
    }

    pub fn weights(&self) -> &DenseMatrix<T> {
        &self.weights
    }

    pub fn bias(&self) -> &DenseMatrix<T> {
        &self.bias
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    fn affine(&self, input: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        if input.cols() != self.weights.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "dense forward",
                left: input.shape(),
                right: self.weights.shape(),
            });
        }
        input.matmul(&self.weights)?.add_row_broadcast(&self.bias)
    }
}

impl<T: Float> Layer<T> for DenseLayer<T> {
    fn forward(&self, input: &DenseMatrix<T>) -> MatrixResult<(DenseMatrix<T>, LayerCache<T>)> {
        let output = self.affine(input)?;
        Ok((output, LayerCache::new(input.clone())))
    }

    fn backward(
        &mut self,
        cache: &LayerCache<T>,
        output_grad: &DenseMatrix<T>,
        learning_rate: T,
    ) -> MatrixResult<DenseMatrix<T>> {
        let input = cache.input();
        if output_grad.shape() != (input.rows(), self.weights.cols()) {
            return Err(MatrixError::DimensionMismatch {
                op: "dense backward",
                left: (input.rows(), self.weights.cols()),
                right: output_grad.shape(),
            });
        }

        let grad_weights = input.transpose().matmul(output_grad)?;
        let grad_bias = output_grad.column_sums();
        // Input gradient uses the weights from before this update.
        let grad_input = output_grad.matmul(&self.weights.transpose())?;

        self.weights.sub_assign(&grad_weights.scale(learning_rate))?;
        self.bias.sub_assign(&grad_bias.scale(learning_rate))?;
        Ok(grad_input)
    }

    fn infer(&self, input: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.affine(input)
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

// ─── Activations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    #[inline]
    pub fn apply<T: Float>(self, x: T) -> T {
        match self {
            Activation::Relu => x.max(T::ZERO),
            Activation::Sigmoid => T::ONE / (T::ONE + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Derivative evaluated at the pre-activation value `x`.
    #[inline]
    pub fn derivative<T: Float>(self, x: T) -> T {
        match self {
            Activation::Relu => {
                if x > T::ZERO {
                    T::ONE
                } else {
                    T::ZERO
                }
            }
            Activation::Sigmoid => {
                let s = self.apply(x);
                s * (T::ONE - s)
            }
            Activation::Tanh => {
                let t = x.tanh();
                T::ONE - t * t
            }
        }
    }
}

/// Element-wise activation with no trainable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationLayer {
    activation: Activation,
}

impl ActivationLayer {
    pub fn new(activation: Activation) -> Self {
        ActivationLayer { activation }
    }

    pub fn relu() -> Self {
        Self::new(Activation::Relu)
    }

    pub fn sigmoid() -> Self {
        Self::new(Activation::Sigmoid)
    }

    pub fn tanh() -> Self {
        Self::new(Activation::Tanh)
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl<T: Float> Layer<T> for ActivationLayer {
    fn forward(&self, input: &DenseMatrix<T>) -> MatrixResult<(DenseMatrix<T>, LayerCache<T>)> {
        let act = self.activation;
        Ok((input.map(|v| act.apply(v)), LayerCache::new(input.clone())))
    }

    fn backward(
        &mut self,
        cache: &LayerCache<T>,
        output_grad: &DenseMatrix<T>,
        _learning_rate: T,
    ) -> MatrixResult<DenseMatrix<T>> {
        let act = self.activation;
        output_grad.hadamard(&cache.input().map(|v| act.derivative(v)))
    }

    fn infer(&self, input: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let act = self.activation;
        Ok(input.map(|v| act.apply(v)))
    }
}
