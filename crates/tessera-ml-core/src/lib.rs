pub mod dtype;
pub mod error;
pub mod matrix;
pub mod predictor;

pub use dtype::Float;
pub use error::{MatrixError, MatrixResult};
pub use matrix::DenseMatrix;
pub use predictor::{Predictor, Transformer};
