use tessera_ml_core::MatrixError;
use tessera_ml_data::DataError;
use thiserror::Error;

/// Errors raised while reading datasets or persisting models.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Model not fitted: nothing to save")]
    NotFitted,

    #[error("Malformed model file: cannot parse {field} from '{value}'")]
    Parse { field: &'static str, value: String },
}

pub type IoResult<T> = Result<T, IoError>;
