use crate::paired;
use tessera_ml_core::{DenseMatrix, Float, MatrixResult};

/// Mean Squared Error.
pub fn mean_squared_error<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let n = y_true.len() as f64;
    let sum: f64 = paired("mean_squared_error", y_true, y_pred)?
        .map(|(t, p)| {
            let d = (t - p).to_f64();
            d * d
        })
        .sum();
    Ok(sum / n)
}

/// Root Mean Squared Error.
pub fn root_mean_squared_error<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    Ok(mean_squared_error(y_true, y_pred)?.sqrt())
}

/// Mean Absolute Error.
pub fn mean_absolute_error<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let n = y_true.len() as f64;
    let sum: f64 = paired("mean_absolute_error", y_true, y_pred)?
        .map(|(t, p)| (t - p).to_f64().abs())
        .sum();
    Ok(sum / n)
}

/// R² (coefficient of determination). Constant targets give `0.0`.
pub fn r2_score<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let pairs: Vec<(f64, f64)> = paired("r2_score", y_true, y_pred)?
        .map(|(t, p)| (t.to_f64(), p.to_f64()))
        .collect();
    let n = pairs.len() as f64;
    let mean_true = pairs.iter().map(|&(t, _)| t).sum::<f64>() / n;

    let ss_res: f64 = pairs.iter().map(|&(t, p)| (t - p) * (t - p)).sum();
    let ss_tot: f64 = pairs.iter().map(|&(t, _)| (t - mean_true) * (t - mean_true)).sum();

    if ss_tot < 1e-15 {
        return Ok(0.0);
    }
    Ok(1.0 - ss_res / ss_tot)
}
