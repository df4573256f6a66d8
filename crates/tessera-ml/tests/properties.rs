use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;
use tessera_ml::core::{DenseMatrix, Predictor};
use tessera_ml::linear::{LinearRegression, LogisticRegression, Penalty};
use tessera_ml::neighbors::KNearestNeighbors;
use tessera_ml::nn::{DenseLayer, LayeredNetwork};

fn random(rows: usize, cols: usize, seed: u64) -> DenseMatrix<f64> {
    DenseMatrix::randn(rows, cols, 0.0, 1.0, &mut StdRng::seed_from_u64(seed))
}

fn line(n: usize) -> (DenseMatrix<f64>, DenseMatrix<f64>) {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
    (DenseMatrix::column_vector(&xs), DenseMatrix::column_vector(&ys))
}

#[test]
fn test_addition_laws() {
    let a = random(7, 5, 1);
    let b = random(7, 5, 2);
    let c = random(7, 5, 3);

    assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    let left = a.add(&b).unwrap().add(&c).unwrap();
    let right = a.add(&b.add(&c).unwrap()).unwrap();
    assert!(left.approx_eq(&right, 1e-12));
}

#[test]
fn test_multiplication_is_associative() {
    let a = random(6, 9, 4);
    let b = random(9, 4, 5);
    let c = random(4, 8, 6);
    let left = a.matmul(&b).unwrap().matmul(&c).unwrap();
    let right = a.matmul(&b.matmul(&c).unwrap()).unwrap();
    assert!(left.approx_eq(&right, 1e-9));
}

#[test]
fn test_double_transpose_is_identity() {
    for &(r, c) in &[(1, 1), (3, 70), (65, 33), (32, 32), (0, 4)] {
        let a = random(r, c, (r * 100 + c) as u64);
        assert_eq!(a.transpose().transpose(), a, "shape {}x{}", r, c);
    }
}

#[test]
fn test_linear_regression_recovers_line() {
    let (x, y) = line(20);
    let mut model = LinearRegression::new(0.1, 0.0, Penalty::None);
    model.fit_epochs(&x, &y, 3000).unwrap();
    assert_abs_diff_eq!(model.weights().unwrap().get(0, 0).unwrap(), 2.0, epsilon = 0.05);
    assert_abs_diff_eq!(model.bias().unwrap(), 1.0, epsilon = 0.05);
}

#[test]
fn test_logistic_regression_separates_classes() {
    let x = DenseMatrix::from_rows(&[
        vec![-2.0, -1.5],
        vec![-1.0, -2.0],
        vec![-1.5, -0.5],
        vec![1.5, 2.0],
        vec![2.0, 1.0],
        vec![1.0, 1.5],
    ])
    .unwrap();
    let y = DenseMatrix::column_vector(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    let mut model = LogisticRegression::new(0.5, 0.0, Penalty::None);
    model.fit_epochs(&x, &y, 500).unwrap();
    let acc = tessera_ml::metrics::accuracy_score(&y, &model.predict(&x).unwrap()).unwrap();
    assert_eq!(acc, 1.0);
}

#[test]
fn test_knn_returns_label_of_duplicate() {
    let x = random(12, 3, 9);
    let labels: Vec<f64> = (0..12).map(|i| (i % 4) as f64).collect();
    let y = DenseMatrix::column_vector(&labels);
    let mut knn = KNearestNeighbors::new(1);
    knn.fit(&x, &y).unwrap();
    for i in 0..12 {
        let pred = knn.predict(&x.row(i).unwrap()).unwrap();
        assert_eq!(pred.get(0, 0).unwrap(), labels[i]);
    }
}

#[test]
fn test_saved_model_predicts_identically() {
    let (x, y) = line(15);
    let mut model = LinearRegression::new(0.1, 0.001, Penalty::L1);
    model.fit_epochs(&x, &y, 400).unwrap();

    let file = NamedTempFile::new().unwrap();
    model.save(file.path()).unwrap();
    let loaded = LinearRegression::<f64>::load(file.path()).unwrap();

    let queries = random(9, 1, 11);
    let a = model.predict(&queries).unwrap();
    let b = loaded.predict(&queries).unwrap();
    assert!(a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .all(|(p, q)| p.to_bits() == q.to_bits()));
}

#[test]
fn test_single_dense_layer_matches_linear_regression() {
    let (x, y) = line(10);
    let lr = 0.1;

    let mut regression = LinearRegression::new(lr, 0.0, Penalty::None);
    regression.fit_epochs(&x, &y, 200).unwrap();

    let layer = DenseLayer::from_parameters(DenseMatrix::zeros(1, 1), DenseMatrix::zeros(1, 1)).unwrap();
    // The MSE gradient carries a factor 2 that the regression update omits.
    let mut network = LayeredNetwork::new(lr / 2.0).with_layer(layer);
    network.fit_epochs(&x, &y, 200).unwrap();

    let queries = DenseMatrix::column_vector(&[-1.0, 0.0, 0.5, 3.0]);
    let expected = regression.predict(&queries).unwrap();
    let actual = network.predict(&queries).unwrap();
    assert!(actual.approx_eq(&expected, 1e-9));
}
