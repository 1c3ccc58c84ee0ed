use std::fmt;

use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use rand::Rng;

use crate::{MlErr, Result};

/// A dense `n x m` matrix of reals.
///
/// The shape is fixed at construction. Single cells can be written through [`Matrix::set`] so
/// element-wise transforms stay cheap, but every arithmetic operation returns a new matrix and
/// leaves its operands untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    values: Array2<f64>,
}

impl Matrix {
    /// Creates a new `rows x cols` matrix filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::zeros(rows, cols)
    }

    /// Creates a matrix from its values in row-major order.
    ///
    /// # Arguments
    /// * `rows` - The number of rows.
    /// * `cols` - The number of columns.
    /// * `values` - Exactly `rows * cols` values.
    ///
    /// # Returns
    /// The matrix, or `MlErr::InvalidArgument` if the amount of values doesn't match the shape.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let len = values.len();
        let values = Array2::from_shape_vec((rows, cols), values).map_err(|_| {
            MlErr::InvalidArgument(format!(
                "{len} values cannot fill a {rows}x{cols} matrix"
            ))
        })?;

        Ok(Self { values })
    }

    /// Creates a matrix from a list of rows.
    ///
    /// # Arguments
    /// * `rows` - The rows of the matrix, all of them of the same length.
    ///
    /// # Returns
    /// The matrix, or `MlErr::InvalidArgument` if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * cols);

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MlErr::InvalidArgument(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }

            values.extend_from_slice(row);
        }

        Self::from_vec(rows.len(), cols, values)
    }

    /// Creates a matrix with `value` at every position.
    pub fn constant(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            values: Array2::from_elem((rows, cols), value),
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, 0.0)
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::constant(rows, cols, 1.0)
    }

    /// Creates a matrix with values drawn uniformly from `[0, 1)`.
    ///
    /// # Arguments
    /// * `rows` - The number of rows.
    /// * `cols` - The number of columns.
    /// * `rng` - The random number generator to sample from.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self {
            values: Array2::from_shape_fn((rows, cols), |_| rng.random::<f64>()),
        }
    }

    /// Creates a `values.len() x 1` column vector.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            values: Array2::from_shape_fn((values.len(), 1), |(i, _)| values[i]),
        }
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// Returns the shape of the matrix as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Whether this matrix is a non empty column vector.
    pub fn is_column_vector(&self) -> bool {
        self.cols() == 1 && self.rows() > 0
    }

    /// Returns the value at the given position.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[[row, col]]
    }

    /// Writes `value` at the given position.
    ///
    /// # Panics
    /// If the position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[[row, col]] = value;
    }

    /// Adds `other` to this matrix.
    ///
    /// # Returns
    /// A new matrix, or `MlErr::DimensionMismatch` if the shapes differ.
    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_shape("add", other)?;
        Ok(Self::from(&self.values + &other.values))
    }

    /// Subtracts `other` from this matrix.
    ///
    /// # Returns
    /// A new matrix, or `MlErr::DimensionMismatch` if the shapes differ.
    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_shape("subtract", other)?;
        Ok(Self::from(&self.values - &other.values))
    }

    pub fn multiply_by_scalar(&self, scalar: f64) -> Matrix {
        Self::from(&self.values * scalar)
    }

    /// Standard matrix product `self · other`.
    ///
    /// # Returns
    /// A new `self.rows() x other.cols()` matrix, or `MlErr::DimensionMismatch` if
    /// `self.cols() != other.rows()`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols() != other.rows() {
            return Err(MlErr::DimensionMismatch {
                op: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }

        Ok(Self::from(self.values.dot(&other.values)))
    }

    pub fn transpose(&self) -> Matrix {
        Self::from(self.values.t().to_owned())
    }

    /// Compares two matrices by value.
    ///
    /// # Returns
    /// `true` if both have the same shape and every pair of values differs by at most `eps`.
    pub fn approx_eq(&self, other: &Matrix, eps: f64) -> bool {
        self.shape() == other.shape()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Sum of the squares of every value, i.e. the squared Frobenius norm.
    pub fn sum_of_squares(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Flattens the matrix in row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Applies `f` to every value in place.
    pub(crate) fn map_inplace<F: Fn(f64) -> f64>(&mut self, f: F) {
        self.values.mapv_inplace(f);
    }

    /// Prepends a constant `1.0` row to a column vector.
    pub(crate) fn with_bias(&self) -> Matrix {
        let rows = self.rows();
        Self {
            values: Array2::from_shape_fn((rows + 1, 1), |(i, _)| {
                if i == 0 {
                    1.0
                } else {
                    self.values[[i - 1, 0]]
                }
            }),
        }
    }

    pub(crate) fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub(crate) fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.values.view_mut()
    }

    fn check_same_shape(&self, op: &'static str, other: &Matrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MlErr::DimensionMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }

        Ok(())
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(values: Array2<f64>) -> Self {
        Self { values }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix [{}x{}]", self.rows(), self.cols())?;
        for row in self.values.rows() {
            for value in row {
                write!(f, "{value:.3} ")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Compares two lists of matrices by value, see [`Matrix::approx_eq`].
pub fn approx_eq_all(a: &[Matrix], b: &[Matrix], eps: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.approx_eq(b, eps))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn left() -> Matrix {
        Matrix::from_rows(&[[1.1, 1.2], [2.3, 3.4], [-1.5, -0.2]]).unwrap()
    }

    #[test]
    fn shape_and_access() {
        let a = left();
        assert_eq!(a.rows(), 3);
        assert_eq!(a.cols(), 2);
        assert!((a.get(2, 1) - -0.2).abs() < 1e-12);
    }

    #[test]
    fn set_writes_a_single_cell() {
        let mut a = Matrix::zeros(2, 2);
        a.set(1, 0, 4.0);
        assert_eq!(a.to_vec(), vec![0.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn multiply() {
        let right = Matrix::from_rows(&[[1.1, 1.2, 1.3], [2.1, 2.2, 2.3]]).unwrap();
        let expected = Matrix::from_rows(&[
            [3.73, 3.96, 4.19],
            [9.67, 10.24, 10.81],
            [-2.07, -2.24, -2.41],
        ])
        .unwrap();

        let product = left().multiply(&right).unwrap();
        assert!(product.approx_eq(&expected, 1e-10), "got {product}");
    }

    #[test]
    fn multiply_with_mismatched_inner_dimensions_fails() {
        let a = left();
        let err = a.multiply(&a).unwrap_err();

        match err {
            MlErr::DimensionMismatch { left, right, .. } => {
                assert_eq!(left, (3, 2));
                assert_eq!(right, (3, 2));
            }
            other => panic!("expected a dimension mismatch, got {other}"),
        }
    }

    #[test]
    fn arithmetic_returns_new_matrices() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = Matrix::ones(2, 2);

        let sum = a.add(&b).unwrap();
        let diff = a.subtract(&b).unwrap();
        let scaled = a.multiply_by_scalar(-2.0);

        assert_eq!(sum.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(diff.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(scaled.to_vec(), vec![-2.0, -4.0, -6.0, -8.0]);
        assert_eq!(a.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn add_with_different_shapes_fails() {
        let err = Matrix::zeros(2, 2).add(&Matrix::zeros(2, 3)).unwrap_err();
        assert!(matches!(err, MlErr::DimensionMismatch { op: "add", .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: [&[f64]; 2] = [&[1.0, 2.0], &[3.0]];
        assert!(matches!(
            Matrix::from_rows(&rows),
            Err(MlErr::InvalidArgument(_))
        ));
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn factories() {
        assert!(Matrix::zeros(2, 3).to_vec().iter().all(|&v| v == 0.0));
        assert!(Matrix::ones(3, 1).to_vec().iter().all(|&v| v == 1.0));
        assert_eq!(Matrix::constant(1, 2, 7.5).to_vec(), vec![7.5, 7.5]);

        let mut rng = StdRng::seed_from_u64(7);
        let r = Matrix::random(4, 5, &mut rng);
        assert_eq!(r.shape(), (4, 5));
        assert!(r.to_vec().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn column_vector_and_bias() {
        let v = Matrix::column_vector(&[0.5, -1.0]);
        assert_eq!(v.shape(), (2, 1));
        assert!(v.is_column_vector());

        let b = v.with_bias();
        assert_eq!(b.to_vec(), vec![1.0, 0.5, -1.0]);
        assert!(!Matrix::zeros(0, 1).is_column_vector());
    }

    #[test]
    fn transpose() {
        let t = left().transpose();
        assert_eq!(t.shape(), (2, 3));
        assert_eq!(t.to_vec(), vec![1.1, 2.3, -1.5, 1.2, 3.4, -0.2]);
    }

    #[test]
    fn approx_eq_is_value_based() {
        let a = Matrix::from_rows(&[[1.0, 2.0]]).unwrap();
        let b = Matrix::from_rows(&[[1.0 + 1e-7, 2.0 - 1e-7]]).unwrap();

        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&b, 1e-8));
        assert!(!a.approx_eq(&a.transpose(), 1.0));
        assert!(approx_eq_all(&[a.clone()], &[b], 1e-6));
        assert!(!approx_eq_all(&[a.clone()], &[], 1e-6));
    }

    #[test]
    fn display() {
        let a = Matrix::from_rows(&[[1.0, -0.5]]).unwrap();
        assert_eq!(a.to_string(), "Matrix [1x2]\n1.000 -0.500 \n");
    }
}
