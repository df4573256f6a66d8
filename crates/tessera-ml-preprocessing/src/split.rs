use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult};

fn take_rows<T: Float>(m: &DenseMatrix<T>, indices: &[usize]) -> MatrixResult<DenseMatrix<T>> {
    let mut data = Vec::with_capacity(indices.len() * m.cols());
    for &i in indices {
        data.extend_from_slice(m.row_values(i)?);
    }
    DenseMatrix::from_vec(indices.len(), m.cols(), data)
}

/// Split data into training and test sets.
///
/// Row indices are shuffled with a generator seeded by `seed`; the test set
/// takes `floor(rows * test_fraction)` rows and the rest go to training.
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split<T: Float>(
    x: &DenseMatrix<T>,
    y: &DenseMatrix<T>,
    test_fraction: f64,
    seed: u64,
) -> MatrixResult<(DenseMatrix<T>, DenseMatrix<T>, DenseMatrix<T>, DenseMatrix<T>)> {
    if x.rows() != y.rows() {
        return Err(MatrixError::DimensionMismatch {
            op: "train_test_split",
            left: x.shape(),
            right: y.shape(),
        });
    }
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(MatrixError::InvalidArgument(format!(
            "test fraction must lie in [0, 1], got {}",
            test_fraction
        )));
    }

    let n = x.rows();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_size = (n as f64 * test_fraction).floor() as usize;
    let (train_idx, test_idx) = indices.split_at(n - test_size);

    Ok((
        take_rows(x, train_idx)?,
        take_rows(x, test_idx)?,
        take_rows(y, train_idx)?,
        take_rows(y, test_idx)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DenseMatrix<f64>, DenseMatrix<f64>) {
        let x = DenseMatrix::from_rows(&[
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
            vec![7.0, 8.0],
            vec![9.0, 10.0],
        ])
        .unwrap();
        let y = DenseMatrix::column_vector(&[1.0, 3.0, 5.0, 7.0, 9.0]);
        (x, y)
    }

    #[test]
    fn test_train_test_split() {
        let (x, y) = data();
        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.5, 42).unwrap();

        // floor(5 * 0.5) = 2
        assert_eq!(x_train.shape(), (3, 2));
        assert_eq!(x_test.shape(), (2, 2));
        assert_eq!(y_train.rows(), 3);
        assert_eq!(y_test.rows(), 2);

        // Rows stay paired: y equals the first feature here.
        for (xs, ys) in [(&x_train, &y_train), (&x_test, &y_test)] {
            for i in 0..xs.rows() {
                assert_eq!(xs.get(i, 0).unwrap(), ys.get(i, 0).unwrap());
            }
        }

        let mut seen: Vec<f64> = y_train.as_slice().iter().chain(y_test.as_slice()).copied().collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(seen, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_split_is_seeded() {
        let (x, y) = data();
        let a = train_test_split(&x, &y, 0.4, 7).unwrap();
        let b = train_test_split(&x, &y, 0.4, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_extremes() {
        let (x, y) = data();
        let (x_train, x_test, _, _) = train_test_split(&x, &y, 0.0, 1).unwrap();
        assert_eq!((x_train.rows(), x_test.rows()), (5, 0));
        let (x_train, x_test, _, _) = train_test_split(&x, &y, 1.0, 1).unwrap();
        assert_eq!((x_train.rows(), x_test.rows()), (0, 5));
    }

    #[test]
    fn test_split_errors() {
        let (x, y) = data();
        assert!(matches!(
            train_test_split(&x, &y, 1.5, 0),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(train_test_split(&x, &y, f64::NAN, 0).is_err());
        assert!(matches!(
            train_test_split(&x, &DenseMatrix::zeros(4, 1), 0.2, 0),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }
}
