//! # Tessera ML
//!
//! A small machine learning library built on one dense matrix type.
//!
//! ## Modules
//!
//! - **core**: `DenseMatrix` with checked arithmetic, tiled transpose and a row-parallel multiply; the `Predictor` and `Transformer` traits
//! - **data**: `DataFrame` of mixed float / integer / text cells, binary category encoding, matrix extraction
//! - **io**: CSV loading, the text model format, JSON snapshots
//! - **linear**: linear and logistic regression by batch gradient descent with optional L1 / L2 penalties
//! - **neighbors**: K-Nearest Neighbors classifier
//! - **nn**: `LayeredNetwork` of dense and activation layers trained with explicit backward caches
//! - **metrics**: MSE, RMSE, MAE, R², accuracy, precision, recall, F1
//! - **preprocessing**: `StandardScaler` and seeded train/test split

/// Dense matrix engine.
pub use tessera_ml_core as core;

/// Tabular data.
pub use tessera_ml_data as data;

/// I/O utilities.
pub use tessera_ml_io as io;

/// Linear models.
pub use tessera_ml_linear as linear;

/// Nearest neighbors.
pub use tessera_ml_neighbors as neighbors;

/// Neural network layers.
pub use tessera_ml_nn as nn;

/// Evaluation metrics.
pub use tessera_ml_metrics as metrics;

/// Data preprocessing.
pub use tessera_ml_preprocessing as preprocessing;
