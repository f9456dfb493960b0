use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::math::vector;

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn identity(n: usize) -> Matrix {
        Matrix::diagonal(&vec![1.0; n])
    }

    /// Square matrix with `entries` along the diagonal.
    pub fn diagonal(entries: &[f64]) -> Matrix {
        let mut res = Matrix::zeros(entries.len(), entries.len());
        for (i, &x) in entries.iter().enumerate() {
            res.data[i][i] = x;
        }
        res
    }

    /// Builds a matrix from rows. Returns `None` for ragged input.
    ///
    /// An empty row list gives a `0 x 0` matrix.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Option<Matrix> {
        let cols = data.first().map_or(0, Vec::len);
        if data.iter().any(|row| row.len() != cols) {
            return None;
        }
        Some(Matrix {
            rows: data.len(),
            cols,
            data,
        })
    }

    /// Entries drawn uniformly from [-1, 1].
    pub fn random_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = rng.gen_range(-1.0..=1.0);
            }
        }
        res
    }

    /// Entries drawn from N(0, 1).
    pub fn random_normal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for x in row.iter_mut() {
                *x = StandardNormal.sample(rng);
            }
        }
        res
    }

    /// Kaiming He initialization: samples from N(0, sqrt(2 / cols)).
    ///
    /// Recommended before ReLU layers. The variance 2/fan_in accounts for
    /// the fact that ReLU zeroes half of its inputs on average.
    ///
    /// Shape: (rows, cols). `cols` is the fan-in (number of input connections).
    pub fn kaiming<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / cols as f64).sqrt();
        Matrix::random_normal(rows, cols, rng).map(|x| x * std_dev)
    }

    /// Xavier (Glorot) initialization: samples uniformly from
    /// [-sqrt(6 / (rows + cols)), sqrt(6 / (rows + cols))].
    ///
    /// Recommended before Tanh/Identity layers. Keeps the variance of
    /// activations and gradients roughly equal across layers.
    pub fn xavier<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let bound = (6.0 / (rows + cols) as f64).sqrt();
        Matrix::random_uniform(rows, cols, rng).map(|x| x * bound)
    }

    /// A Gaussian matrix orthonormalised along its shorter dimension: the
    /// columns are orthonormal when `rows >= cols`, the rows otherwise.
    pub fn gaussian_orthonormal<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let tall = rows >= cols;
        let (len, count) = if tall { (rows, cols) } else { (cols, rows) };

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(count);
        while basis.len() < count {
            let mut v: Vec<f64> = (0..len).map(|_| StandardNormal.sample(rng)).collect();
            // Two Gram-Schmidt passes keep the result orthogonal to machine precision.
            for _ in 0..2 {
                for q in &basis {
                    let proj = vector::dot(&v, q);
                    for (vi, qi) in v.iter_mut().zip(q) {
                        *vi -= proj * qi;
                    }
                }
            }
            let norm = vector::dot(&v, &v).sqrt();
            if norm < 1e-10 {
                continue;
            }
            v.iter_mut().for_each(|x| *x /= norm);
            basis.push(v);
        }

        if tall {
            Matrix::from_rows(basis).map_or_else(|| Matrix::zeros(rows, cols), |m| m.transpose())
        } else {
            Matrix {
                rows,
                cols,
                data: basis,
            }
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Applies `functor` to every entry in place.
    pub fn apply<F>(&mut self, functor: F)
    where
        F: Fn(f64) -> f64,
    {
        for row in self.data.iter_mut() {
            for x in row.iter_mut() {
                *x = functor(*x);
            }
        }
    }

    /// Combines every entry with the matching entry of `other` in place.
    /// Callers guarantee equal shapes.
    pub fn zip_apply<F>(&mut self, other: &Matrix, functor: F)
    where
        F: Fn(f64, f64) -> f64,
    {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        for (row, other_row) in self.data.iter_mut().zip(&other.data) {
            for (x, &y) in row.iter_mut().zip(other_row) {
                *x = functor(*x, y);
            }
        }
    }

    /// `self · v`. Callers guarantee `v.len() == self.cols`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols, v.len());
        self.data.iter().map(|row| vector::dot(row, v)).collect()
    }

    /// `selfᵀ · v` without materialising the transpose.
    pub fn transpose_mul_vec(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.rows, v.len());
        let mut res = vec![0.0; self.cols];
        for (row, &scale) in self.data.iter().zip(v) {
            for (acc, &x) in res.iter_mut().zip(row) {
                *acc += scale * x;
            }
        }
        res
    }

    /// `a · bᵀ`, shape `(a.len(), b.len())`.
    pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
        Matrix {
            rows: a.len(),
            cols: b.len(),
            data: a
                .iter()
                .map(|&x| b.iter().map(|&y| x * y).collect())
                .collect(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn is_finite(&self) -> bool {
        self.entries().all(f64::is_finite)
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries().map(|x| x * x).sum()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix {
            rows: 0,
            cols: 0,
            data: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> Matrix {
        Matrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        assert!(Matrix::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn mul_vec_and_transpose_mul_vec_agree_with_transpose() {
        let m = sample();
        assert_eq!(m.mul_vec(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
        assert_eq!(m.transpose_mul_vec(&[1.0, 2.0]), m.transpose().mul_vec(&[1.0, 2.0]));
    }

    #[test]
    fn outer_product_has_expected_entries() {
        let m = Matrix::outer(&[1.0, 2.0], &[3.0, 4.0, 5.0]);
        assert_eq!((m.rows, m.cols), (2, 3));
        assert_eq!(m.data[1], vec![6.0, 8.0, 10.0]);
    }

    #[test]
    fn gaussian_orthonormal_has_orthonormal_short_side() {
        let mut rng = StdRng::seed_from_u64(7);
        for (rows, cols) in [(6, 3), (3, 6), (4, 4)] {
            let m = Matrix::gaussian_orthonormal(rows, cols, &mut rng);
            assert_eq!((m.rows, m.cols), (rows, cols));
            // Gram matrix along the short side must be the identity.
            let short = if rows >= cols { m.transpose() } else { m.clone() };
            for i in 0..short.rows {
                for j in 0..short.rows {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert_abs_diff_eq!(
                        vector::dot(&short.data[i], &short.data[j]),
                        expected,
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn xavier_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(1);
        let m = Matrix::xavier(5, 7, &mut rng);
        let bound = (6.0_f64 / 12.0).sqrt();
        assert!(m.entries().all(|x| x.abs() <= bound));
    }

    #[test]
    fn is_finite_detects_nan() {
        let mut m = sample();
        assert!(m.is_finite());
        m.data[1][2] = f64::NAN;
        assert!(!m.is_finite());
    }
}
