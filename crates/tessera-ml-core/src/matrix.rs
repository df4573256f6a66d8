use crate::dtype::Float;
use crate::error::{MatrixError, MatrixResult};

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{self, Range};

/// Edge of the square tiles walked by [`DenseMatrix::transpose`].
const TILE: usize = 32;

/// Multiply-add count above which [`DenseMatrix::matmul`] splits output rows
/// across the rayon pool.
const PAR_THRESHOLD: usize = 1 << 16;

/// Fixed-shape 2-D matrix consumed by every model.
///
/// Stores `rows * cols` elements in a flat contiguous `Vec<T>` with row-major
/// layout. Cloning copies the elements; two matrices never share storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float", try_from = "RawMatrix<T>")]
pub struct DenseMatrix<T: Float> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(bound = "T: Float")]
struct RawMatrix<T: Float> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Float> TryFrom<RawMatrix<T>> for DenseMatrix<T> {
    type Error = MatrixError;

    fn try_from(raw: RawMatrix<T>) -> MatrixResult<Self> {
        DenseMatrix::from_vec(raw.rows, raw.cols, raw.data)
    }
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> DenseMatrix<T> {
    /// Create a zero-filled `rows x cols` matrix.
    ///
    /// Fails when `rows * cols` does not fit in `usize`.
    pub fn new(rows: usize, cols: usize) -> MatrixResult<Self> {
        let len = element_count(rows, cols)?;
        Ok(DenseMatrix {
            rows,
            cols,
            data: vec![T::ZERO; len],
        })
    }

    /// Zero-filled matrix whose shape is already known to be representable,
    /// e.g. derived from an existing matrix.
    ///
    /// # Panics
    /// If `rows * cols` overflows `usize`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::ZERO)
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        DenseMatrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap row-major data in a matrix of the given shape.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> MatrixResult<Self> {
        let len = element_count(rows, cols)?;
        if data.len() != len {
            return Err(MatrixError::InvalidArgument(format!(
                "{} elements cannot fill a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(DenseMatrix { rows, cols, data })
    }

    /// Build a matrix from nested rows. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<T>]) -> MatrixResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::DimensionMismatch {
                    op: "from_rows",
                    left: (1, n_cols),
                    right: (i, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(DenseMatrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// `(n, 1)` column vector.
    pub fn column_vector(values: &[T]) -> Self {
        DenseMatrix {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    /// Gaussian samples with the given mean and standard deviation (Box-Muller).
    ///
    /// The random source is supplied by the caller so that initialization is
    /// reproducible under a seeded generator.
    pub fn randn<R: Rng>(rows: usize, cols: usize, mean: T, std_dev: T, rng: &mut R) -> Self {
        let n = rows * cols;
        let mut data = Vec::with_capacity(n);
        while data.len() < n {
            let u1: f64 = rng.gen::<f64>().max(1e-12);
            let u2: f64 = rng.gen::<f64>();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * u2;
            data.push(mean + std_dev * T::from_f64(r * theta.cos()));
            if data.len() < n {
                data.push(mean + std_dev * T::from_f64(r * theta.sin()));
            }
        }
        DenseMatrix { rows, cols, data }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn offset(&self, row: usize, col: usize) -> MatrixResult<usize> {
        if row >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: row,
                axis: 0,
                size: self.rows,
            });
        }
        if col >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: col,
                axis: 1,
                size: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    /// Read the element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> MatrixResult<T> {
        let at = self.offset(row, col)?;
        Ok(self.data[at])
    }

    /// Overwrite the element at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> MatrixResult<()> {
        let at = self.offset(row, col)?;
        self.data[at] = value;
        Ok(())
    }

    /// Borrow one row as a slice.
    pub fn row_values(&self, row: usize) -> MatrixResult<&[T]> {
        if row >= self.rows {
            return Err(MatrixError::IndexOutOfBounds {
                index: row,
                axis: 0,
                size: self.rows,
            });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Copy one row into a new `(1, cols)` matrix.
    pub fn row(&self, row: usize) -> MatrixResult<DenseMatrix<T>> {
        let values = self.row_values(row)?;
        Ok(DenseMatrix {
            rows: 1,
            cols: self.cols,
            data: values.to_vec(),
        })
    }

    /// Copy one column into a new `(rows, 1)` matrix.
    pub fn column(&self, col: usize) -> MatrixResult<DenseMatrix<T>> {
        if col >= self.cols {
            return Err(MatrixError::IndexOutOfBounds {
                index: col,
                axis: 1,
                size: self.cols,
            });
        }
        let data = (0..self.rows).map(|i| self.data[i * self.cols + col]).collect();
        Ok(DenseMatrix {
            rows: self.rows,
            cols: 1,
            data,
        })
    }

    /// Copy the sub-rectangle covered by two half-open ranges.
    ///
    /// Both ranges must be non-empty and lie inside the matrix.
    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> MatrixResult<DenseMatrix<T>> {
        check_range(&rows, 0, self.rows)?;
        check_range(&cols, 1, self.cols)?;
        let width = cols.end - cols.start;
        let mut data = Vec::with_capacity(rows.len() * width);
        for i in rows.clone() {
            let start = i * self.cols + cols.start;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Ok(DenseMatrix {
            rows: rows.len(),
            cols: width,
            data,
        })
    }

    // ─── Shape Manipulation ─────────────────────────────────────────────────

    /// Transpose, walking the index space in `TILE x TILE` blocks so that
    /// both the source rows and destination rows of a block stay in cache.
    pub fn transpose(&self) -> DenseMatrix<T> {
        let (rows, cols) = (self.rows, self.cols);
        let mut out = DenseMatrix::zeros(cols, rows);
        for i0 in (0..rows).step_by(TILE) {
            let i_end = (i0 + TILE).min(rows);
            for j0 in (0..cols).step_by(TILE) {
                let j_end = (j0 + TILE).min(cols);
                for i in i0..i_end {
                    for j in j0..j_end {
                        out.data[j * rows + i] = self.data[i * cols + j];
                    }
                }
            }
        }
        out
    }

    // ─── Element-wise Operations ────────────────────────────────────────────

    pub fn map<F: Fn(T) -> T>(&self, f: F) -> DenseMatrix<T> {
        DenseMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    fn zip_with<F: Fn(T, T) -> T>(
        &self,
        other: &DenseMatrix<T>,
        op: &'static str,
        f: F,
    ) -> MatrixResult<DenseMatrix<T>> {
        self.check_same_shape(other, op)?;
        Ok(DenseMatrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    fn check_same_shape(&self, other: &DenseMatrix<T>, op: &'static str) -> MatrixResult<()> {
        if self.shape() != other.shape() {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    pub fn sub_assign(&mut self, other: &DenseMatrix<T>) -> MatrixResult<()> {
        self.check_same_shape(other, "sub_assign")?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a -= b;
        }
        Ok(())
    }

    pub fn scale(&self, s: T) -> DenseMatrix<T> {
        self.map(|v| v * s)
    }

    pub fn scale_mut(&mut self, s: T) {
        for v in self.data.iter_mut() {
            *v *= s;
        }
    }

    pub fn add_scalar(&self, s: T) -> DenseMatrix<T> {
        self.map(|v| v + s)
    }

    /// Add a `(1, cols)` row to every row of `self`.
    pub fn add_row_broadcast(&self, row: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        if row.rows != 1 || row.cols != self.cols {
            return Err(MatrixError::DimensionMismatch {
                op: "add_row_broadcast",
                left: self.shape(),
                right: row.shape(),
            });
        }
        let mut out = self.clone();
        if self.cols > 0 {
            for out_row in out.data.chunks_mut(self.cols) {
                for (v, &b) in out_row.iter_mut().zip(row.data.iter()) {
                    *v += b;
                }
            }
        }
        Ok(out)
    }

    // ─── Reductions ─────────────────────────────────────────────────────────

    pub fn sum(&self) -> T {
        self.data.iter().copied().sum()
    }

    /// Sum over rows, giving a `(1, cols)` matrix.
    pub fn column_sums(&self) -> DenseMatrix<T> {
        let mut out = DenseMatrix::zeros(1, self.cols);
        if self.cols > 0 {
            for row in self.data.chunks(self.cols) {
                for (acc, &v) in out.data.iter_mut().zip(row.iter()) {
                    *acc += v;
                }
            }
        }
        out
    }

    /// Same shape and every element within `tol` of its counterpart.
    pub fn approx_eq(&self, other: &DenseMatrix<T>, tol: T) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a - b).abs() <= tol)
    }

    // ─── Matrix Multiply ────────────────────────────────────────────────────

    /// Matrix product `self * other`.
    ///
    /// Loops run (row i, inner k, output column j): each `self[i][k]` is
    /// broadcast along row `k` of `other` into the contiguous output row `i`.
    /// Large products hand whole output rows to rayon; every element is still
    /// accumulated in the same k order, so the result does not depend on the
    /// thread count.
    pub fn matmul(&self, other: &DenseMatrix<T>) -> MatrixResult<DenseMatrix<T>> {
        if self.cols != other.rows {
            return Err(MatrixError::DimensionMismatch {
                op: "matmul",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut out = DenseMatrix::zeros(m, n);
        if m == 0 || n == 0 {
            return Ok(out);
        }

        let lhs = &self.data;
        let rhs = &other.data;
        let kernel = |(i, out_row): (usize, &mut [T])| {
            for (p, &a) in lhs[i * k..(i + 1) * k].iter().enumerate() {
                let rhs_row = &rhs[p * n..(p + 1) * n];
                for (acc, &b) in out_row.iter_mut().zip(rhs_row.iter()) {
                    *acc += a * b;
                }
            }
        };

        if m.saturating_mul(k).saturating_mul(n) >= PAR_THRESHOLD {
            out.data.par_chunks_mut(n).enumerate().for_each(kernel);
        } else {
            out.data.chunks_mut(n).enumerate().for_each(kernel);
        }
        Ok(out)
    }
}

fn element_count(rows: usize, cols: usize) -> MatrixResult<usize> {
    rows.checked_mul(cols).ok_or_else(|| {
        MatrixError::InvalidArgument(format!(
            "a {}x{} matrix has more elements than usize can count",
            rows, cols
        ))
    })
}

fn check_range(range: &Range<usize>, axis: usize, size: usize) -> MatrixResult<()> {
    if range.start >= range.end || range.end > size {
        return Err(MatrixError::InvalidRange {
            start: range.start,
            end: range.end,
            axis,
            size,
        });
    }
    Ok(())
}

// ─── Operator Overloads ─────────────────────────────────────────────────────

impl<T: Float> ops::Add for &DenseMatrix<T> {
    type Output = MatrixResult<DenseMatrix<T>>;
    fn add(self, rhs: Self) -> MatrixResult<DenseMatrix<T>> {
        DenseMatrix::add(self, rhs)
    }
}

impl<T: Float> ops::Sub for &DenseMatrix<T> {
    type Output = MatrixResult<DenseMatrix<T>>;
    fn sub(self, rhs: Self) -> MatrixResult<DenseMatrix<T>> {
        DenseMatrix::sub(self, rhs)
    }
}

macro_rules! impl_scalar_mul {
    ($($t:ty),*) => {$(
        impl ops::Mul<$t> for &DenseMatrix<$t> {
            type Output = DenseMatrix<$t>;
            fn mul(self, rhs: $t) -> DenseMatrix<$t> {
                self.scale(rhs)
            }
        }

        impl ops::Mul<$t> for DenseMatrix<$t> {
            type Output = DenseMatrix<$t>;
            fn mul(mut self, rhs: $t) -> DenseMatrix<$t> {
                self.scale_mut(rhs);
                self
            }
        }

        impl ops::Mul<&DenseMatrix<$t>> for $t {
            type Output = DenseMatrix<$t>;
            fn mul(self, rhs: &DenseMatrix<$t>) -> DenseMatrix<$t> {
                rhs.scale(self)
            }
        }

        impl ops::Mul<DenseMatrix<$t>> for $t {
            type Output = DenseMatrix<$t>;
            fn mul(self, mut rhs: DenseMatrix<$t>) -> DenseMatrix<$t> {
                rhs.scale_mut(self);
                rhs
            }
        }
    )*};
}

impl_scalar_mul!(f32, f64);

// ─── Display ────────────────────────────────────────────────────────────────

impl<T: Float> fmt::Display for DenseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix({}x{}) [", self.rows, self.cols)?;
        for i in 0..self.rows {
            write!(f, "  [")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.data[i * self.cols + j])?;
            }
            write!(f, "]")?;
            if i + 1 < self.rows {
                writeln!(f, ",")?;
            }
        }
        write!(f, "\n]")
    }
}
