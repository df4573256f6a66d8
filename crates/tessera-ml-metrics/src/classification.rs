use crate::paired;
use tessera_ml_core::{DenseMatrix, Float, MatrixResult};

/// Fraction of predictions exactly equal to the true label.
pub fn accuracy_score<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let n = y_true.len() as f64;
    let correct = paired("accuracy_score", y_true, y_pred)?
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / n)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BinaryCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

/// Confusion counts with `1.0` as the positive class.
fn binary_counts<T: Float>(op: &'static str, y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<BinaryCounts> {
    let mut counts = BinaryCounts::default();
    for (t, p) in paired(op, y_true, y_pred)? {
        match (t == T::ONE, p == T::ONE) {
            (true, true) => counts.tp += 1,
            (false, true) => counts.fp += 1,
            (true, false) => counts.fn_ += 1,
            (false, false) => {}
        }
    }
    Ok(counts)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// `tp / (tp + fp)`; `0.0` when nothing was predicted positive.
pub fn precision_score<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let c = binary_counts("precision_score", y_true, y_pred)?;
    Ok(ratio(c.tp, c.tp + c.fp))
}

/// `tp / (tp + fn)`; `0.0` when there are no positive labels.
pub fn recall_score<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let c = binary_counts("recall_score", y_true, y_pred)?;
    Ok(ratio(c.tp, c.tp + c.fn_))
}

/// Harmonic mean of precision and recall.
pub fn f1_score<T: Float>(y_true: &DenseMatrix<T>, y_pred: &DenseMatrix<T>) -> MatrixResult<f64> {
    let c = binary_counts("f1_score", y_true, y_pred)?;
    let precision = ratio(c.tp, c.tp + c.fp);
    let recall = ratio(c.tp, c.tp + c.fn_);
    if precision + recall == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * precision * recall / (precision + recall))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tessera_ml_core::MatrixError;

    fn col(v: &[f64]) -> DenseMatrix<f64> {
        DenseMatrix::column_vector(v)
    }

    #[test]
    fn test_accuracy() {
        let acc = accuracy_score(&col(&[0.0, 1.0, 1.0, 0.0]), &col(&[0.0, 1.0, 0.0, 0.0])).unwrap();
        assert_abs_diff_eq!(acc, 0.75);
    }

    #[test]
    fn test_precision_recall_f1() {
        // tp = 2, fp = 1, fn = 1
        let y_true = col(&[1.0, 1.0, 1.0, 0.0, 0.0]);
        let y_pred = col(&[1.0, 1.0, 0.0, 1.0, 0.0]);
        assert_abs_diff_eq!(precision_score(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(recall_score(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f1_score(&y_true, &y_pred).unwrap(), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_denominators() {
        let y_true = col(&[0.0, 0.0]);
        let y_pred = col(&[0.0, 0.0]);
        assert_eq!(precision_score(&y_true, &y_pred).unwrap(), 0.0);
        assert_eq!(recall_score(&y_true, &y_pred).unwrap(), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred).unwrap(), 0.0);
    }

    #[test]
    fn test_mismatch() {
        assert!(matches!(
            f1_score(&col(&[1.0]), &col(&[1.0, 0.0])),
            Err(MatrixError::DimensionMismatch { op: "f1_score", .. })
        ));
    }
}
