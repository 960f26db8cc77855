//! Dense LU decomposition with partial pivoting, for the banded collocation
//! and normal-equation systems arising in spline fitting.

use crate::cgmath64::*;
use crate::tolerance::*;

/// LU decomposition of a square matrix, rows permuted by partial pivoting.
#[derive(Clone, Debug)]
pub struct Lu {
    factors: Vec<Vec<f64>>,
    pivots: Vec<usize>,
}

impl Lu {
    /// Decomposes `matrix` into the packed LU form.
    /// Returns `None` if the matrix is singular up to tolerance.
    /// # Examples
    /// ```
    /// use loft_base::lu::Lu;
    /// let matrix = vec![
    ///     vec![0.0, 2.0],
    ///     vec![3.0, 1.0],
    /// ];
    /// assert!(Lu::decompose(matrix).is_some());
    ///
    /// let singular = vec![
    ///     vec![1.0, 2.0],
    ///     vec![2.0, 4.0],
    /// ];
    /// assert!(Lu::decompose(singular).is_none());
    /// ```
    pub fn decompose(mut matrix: Vec<Vec<f64>>) -> Option<Lu> {
        let n = matrix.len();
        let mut pivots = Vec::with_capacity(n);
        for k in 0..n {
            let pivot = (k..n).fold(k, |pivot, i| {
                match matrix[i][k].abs() > matrix[pivot][k].abs() {
                    true => i,
                    false => pivot,
                }
            });
            if matrix[pivot][k].so_small() {
                return None;
            }
            matrix.swap(k, pivot);
            pivots.push(pivot);
            let diag = matrix[k][k];
            for i in (k + 1)..n {
                let coef = matrix[i][k] / diag;
                matrix[i][k] = coef;
                for j in (k + 1)..n {
                    matrix[i][j] = matrix[i][j] - coef * matrix[k][j];
                }
            }
        }
        Some(Lu {
            factors: matrix,
            pivots,
        })
    }

    /// Solves the decomposed system for a vector-valued right hand side by
    /// forward and back substitution. Each component of the value type is
    /// solved simultaneously.
    pub fn solve<V>(&self, rhs: &[V]) -> Vec<V>
    where V: VectorSpace<Scalar = f64> {
        let n = self.factors.len();
        let mut res = Vec::from(rhs);
        for (k, &pivot) in self.pivots.iter().enumerate() {
            res.swap(k, pivot);
        }
        for i in 1..n {
            let sum = (0..i).fold(V::zero(), |sum, j| sum + res[j] * self.factors[i][j]);
            res[i] = res[i] - sum;
        }
        for i in (0..n).rev() {
            let sum = ((i + 1)..n).fold(V::zero(), |sum, j| sum + res[j] * self.factors[i][j]);
            res[i] = (res[i] - sum) / self.factors[i][i];
        }
        res
    }
}

/// Returns the transposed matrix.
pub fn transposed(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let (n, m) = (matrix.len(), matrix[0].len());
    (0..m)
        .map(|j| (0..n).map(|i| matrix[i][j]).collect())
        .collect()
}

/// Returns the matrix product of `a` and `b`.
pub fn multiplied(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let (n, k, m) = (a.len(), b.len(), b[0].len());
    (0..n)
        .map(|i| {
            (0..m)
                .map(|j| (0..k).fold(0.0, |sum, l| sum + a[i][l] * b[l][j]))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_small_system() {
        let matrix = vec![
            vec![2.0, 1.0, 0.0],
            vec![1.0, 3.0, 1.0],
            vec![0.0, 1.0, 2.0],
        ];
        let rhs = vec![
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
        ];
        let lu = Lu::decompose(matrix.clone()).unwrap();
        let sol = lu.solve(&rhs);
        for i in 0..3 {
            let got = (0..3).fold(Vector2::zero(), |sum, j| sum + sol[j] * matrix[i][j]);
            assert!((got - rhs[i]).magnitude() < 1.0e-10);
        }
    }

    #[test]
    fn pivoting_handles_zero_diagonal() {
        let matrix = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let lu = Lu::decompose(matrix).unwrap();
        let sol = lu.solve(&[Vector1::new(3.0), Vector1::new(5.0)]);
        assert!((sol[0][0] - 5.0).abs() < 1.0e-10);
        assert!((sol[1][0] - 3.0).abs() < 1.0e-10);
    }

    #[test]
    fn transpose_and_multiply() {
        let a = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let at = transposed(&a);
        assert_eq!(at.len(), 3);
        assert_eq!(at[2], vec![3.0, 6.0]);
        let ata = multiplied(&at, &a);
        assert_eq!(ata.len(), 3);
        assert_eq!(ata[0][0], 17.0);
        assert_eq!(ata[1][2], 36.0);
    }
}
