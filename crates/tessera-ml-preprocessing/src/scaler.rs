use serde::{Deserialize, Serialize};
use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult, Transformer};

/// Standardize features by removing the mean and scaling to unit variance.
///
/// Uses the population standard deviation. Constant columns get a scale of
/// 1 so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct StandardScaler<T: Float> {
    mean: Option<Vec<T>>,
    std: Option<Vec<T>>,
}

impl<T: Float> StandardScaler<T> {
    pub fn new() -> Self {
        StandardScaler {
            mean: None,
            std: None,
        }
    }

    pub fn mean(&self) -> Option<&[T]> {
        self.mean.as_deref()
    }

    pub fn std(&self) -> Option<&[T]> {
        self.std.as_deref()
    }
}

impl<T: Float> Transformer<T> for StandardScaler<T> {
    /// Compute per-column mean and standard deviation from `(samples, features)`.
    fn fit(&mut self, x: &DenseMatrix<T>) -> MatrixResult<()> {
        if x.rows() == 0 {
            return Err(MatrixError::InvalidArgument(
                "cannot fit a scaler on zero samples".into(),
            ));
        }
        let n = T::from_usize(x.rows());
        let mean: Vec<T> = x.column_sums().as_slice().iter().map(|&s| s / n).collect();

        let mut var = vec![T::ZERO; x.cols()];
        for i in 0..x.rows() {
            for (v, (&xi, &m)) in var.iter_mut().zip(x.row_values(i)?.iter().zip(&mean)) {
                let d = xi - m;
                *v += d * d;
            }
        }
        let std = var
            .into_iter()
            .map(|v| {
                let s = (v / n).sqrt();
                if s == T::ZERO {
                    T::ONE
                } else {
                    s
                }
            })
            .collect();

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(())
    }

    fn transform(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(MatrixError::NotFitted),
        };
        if x.cols() != mean.len() {
            return Err(MatrixError::DimensionMismatch {
                op: "transform",
                left: x.shape(),
                right: (1, mean.len()),
            });
        }

        let mut out = x.clone();
        let cols = x.cols();
        if cols > 0 {
            for row in out.as_mut_slice().chunks_mut(cols) {
                for ((v, &m), &s) in row.iter_mut().zip(mean).zip(std) {
                    *v = (*v - m) / s;
                }
            }
        }
        Ok(out)
    }
}
