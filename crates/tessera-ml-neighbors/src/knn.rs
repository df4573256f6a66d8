use tessera_ml_core::{DenseMatrix, Float, MatrixError, MatrixResult, Predictor};

/// K-Nearest Neighbors classifier with Euclidean distance and majority vote.
///
/// `fit` only stores the training data. Every query row is compared against
/// every training row; there is no spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct KNearestNeighbors<T: Float> {
    k: usize,
    train: Option<(DenseMatrix<T>, DenseMatrix<T>)>,
}

impl<T: Float> KNearestNeighbors<T> {
    pub fn new(k: usize) -> Self {
        KNearestNeighbors { k, train: None }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn is_fitted(&self) -> bool {
        self.train.is_some()
    }

    fn distance(a: &[T], b: &[T]) -> T {
        a.iter()
            .zip(b)
            .map(|(&p, &q)| {
                let d = p - q;
                d * d
            })
            .sum::<T>()
            .sqrt()
    }

    /// Most frequent label among `labels`; equal counts go to the smallest label.
    fn vote(labels: impl Iterator<Item = T>) -> Option<T> {
        let mut tally: Vec<(T, usize)> = Vec::new();
        for label in labels {
            match tally.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((label, 1)),
            }
        }
        tally
            .into_iter()
            .max_by(|(la, ca), (lb, cb)| {
                ca.cmp(cb)
                    .then_with(|| lb.to_f64().total_cmp(&la.to_f64()))
            })
            .map(|(label, _)| label)
    }
}

impl<T: Float> Predictor<T> for KNearestNeighbors<T> {
    /// Store copies of `x` and `y`.
    fn fit(&mut self, x: &DenseMatrix<T>, y: &DenseMatrix<T>) -> MatrixResult<()> {
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
        if self.k > x.rows() {
            log::debug!(
                "k = {} exceeds {} training rows; votes will use every row",
                self.k,
                x.rows()
            );
        }
        self.train = Some((x.clone(), y.clone()));
        Ok(())
    }

    fn predict(&self, x: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        let (x_train, y_train) = self.train.as_ref().ok_or(MatrixError::NotFitted)?;
        if self.k == 0 {
            return Err(MatrixError::InvalidArgument("k must be at least 1".into()));
        }
        if x.cols() != x_train.cols() {
            return Err(MatrixError::DimensionMismatch {
                op: "predict",
                left: x.shape(),
                right: x_train.shape(),
            });
        }

        let labels = y_train.as_slice();
        let k = self.k.min(x_train.rows());
        let mut predictions = Vec::with_capacity(x.rows());
        let mut dists: Vec<(T, usize)> = Vec::with_capacity(x_train.rows());

        for i in 0..x.rows() {
            let query = x.row_values(i)?;
            dists.clear();
            for j in 0..x_train.rows() {
                dists.push((Self::distance(query, x_train.row_values(j)?), j));
            }
            // Stable: equal distances keep training order.
            dists.sort_by(|a, b| a.0.to_f64().total_cmp(&b.0.to_f64()));

            let winner = Self::vote(dists[..k].iter().map(|&(_, j)| labels[j]))
                .ok_or_else(|| MatrixError::InvalidArgument("no neighbours to vote".into()))?;
            predictions.push(winner);
        }

        Ok(DenseMatrix::column_vector(&predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> (DenseMatrix<f64>, DenseMatrix<f64>) {
        let x = DenseMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.5, 0.0],
            vec![0.0, 0.5],
            vec![10.0, 10.0],
            vec![10.5, 10.0],
            vec![10.0, 10.5],
        ])
        .unwrap();
        let y = DenseMatrix::column_vector(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn test_knn_classifier() {
        let (x, y) = clusters();
        let mut knn = KNearestNeighbors::new(3);
        knn.fit(&x, &y).unwrap();

        let query = DenseMatrix::from_rows(&[vec![1.0, 1.0], vec![9.0, 9.0]]).unwrap();
        let pred = knn.predict(&query).unwrap();
        assert_eq!(pred.as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn test_k1_duplicate_returns_its_label() {
        let x = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let y = DenseMatrix::column_vector(&[7.0, 8.0, 9.0]);
        let mut knn = KNearestNeighbors::new(1);
        knn.fit(&x, &y).unwrap();
        let pred = knn.predict(&x.row(1).unwrap()).unwrap();
        assert_eq!(pred.as_slice(), &[8.0]);
    }

    #[test]
    fn test_tie_resolves_to_smallest_label() {
        // Two neighbours, one vote each.
        let x = DenseMatrix::from_rows(&[vec![1.0], vec![-1.0]]).unwrap();
        let y = DenseMatrix::column_vector(&[5.0, 2.0]);
        let mut knn = KNearestNeighbors::new(2);
        knn.fit(&x, &y).unwrap();
        let pred = knn.predict(&DenseMatrix::column_vector(&[0.0])).unwrap();
        assert_eq!(pred.as_slice(), &[2.0]);
    }

    #[test]
    fn test_equal_distances_keep_training_order() {
        // Both points sit at distance 1; k = 1 takes the first one stored.
        let x = DenseMatrix::from_rows(&[vec![1.0], vec![-1.0]]).unwrap();
        let y = DenseMatrix::column_vector(&[5.0, 2.0]);
        let mut knn = KNearestNeighbors::new(1);
        knn.fit(&x, &y).unwrap();
        let pred = knn.predict(&DenseMatrix::column_vector(&[0.0])).unwrap();
        assert_eq!(pred.as_slice(), &[5.0]);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let (x, y) = clusters();
        let mut knn = KNearestNeighbors::new(50);
        knn.fit(&x, &y).unwrap();
        // Three votes each: tie goes to 0.
        let pred = knn.predict(&DenseMatrix::from_rows(&[vec![10.0, 10.0]]).unwrap()).unwrap();
        assert_eq!(pred.as_slice(), &[0.0]);
    }

    #[test]
    fn test_fit_rejects_empty_features() {
        let mut knn = KNearestNeighbors::<f64>::new(1);
        let y = DenseMatrix::column_vector(&[0.0, 1.0]);
        assert!(matches!(
            knn.fit(&DenseMatrix::zeros(2, 0), &y),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(matches!(
            knn.fit(&DenseMatrix::zeros(0, 2), &DenseMatrix::zeros(0, 1)),
            Err(MatrixError::InvalidArgument(_))
        ));
        assert!(!knn.is_fitted());
    }

    #[test]
    fn test_errors() {
        let (x, y) = clusters();
        let knn = KNearestNeighbors::<f64>::new(1);
        assert_eq!(knn.predict(&x).unwrap_err(), MatrixError::NotFitted);

        let mut zero = KNearestNeighbors::new(0);
        zero.fit(&x, &y).unwrap();
        assert!(matches!(zero.predict(&x), Err(MatrixError::InvalidArgument(_))));

        let mut knn = KNearestNeighbors::new(1);
        knn.fit(&x, &y).unwrap();
        assert!(matches!(
            knn.predict(&DenseMatrix::zeros(1, 3)),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }
}
