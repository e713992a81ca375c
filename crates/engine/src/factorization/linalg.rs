//! Bridges between `ndarray` storage and `nalgebra` decompositions

use crate::error::{RecommenderError, Result};
use nalgebra::{DMatrix, DVector, Dyn, SVD};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Pivots below this fraction of the original diagonal count as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

pub(crate) fn to_dmatrix(values: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(values.nrows(), values.ncols(), |i, j| values[[i, j]])
}

/// Cholesky factor of a symmetric positive definite system, reused across
/// right-hand sides.
pub struct CholeskySolver {
    factor: nalgebra::Cholesky<f64, Dyn>,
}

impl CholeskySolver {
    /// Factor `a`, failing with `SingularSystem` if it is not positive
    /// definite or a pivot vanishes relative to its diagonal entry.
    pub fn factor(a: ArrayView2<'_, f64>) -> Result<Self> {
        if a.nrows() != a.ncols() {
            return Err(RecommenderError::dimension_mismatch(format!(
                "cannot factor a {}x{} matrix",
                a.nrows(),
                a.ncols()
            )));
        }

        let factor =
            nalgebra::Cholesky::new(to_dmatrix(a)).ok_or(RecommenderError::SingularSystem)?;

        let lower = factor.l_dirty();
        for i in 0..a.nrows() {
            let pivot = lower[(i, i)] * lower[(i, i)];
            if !pivot.is_finite() || pivot <= PIVOT_TOLERANCE * a[[i, i]].abs() {
                return Err(RecommenderError::SingularSystem);
            }
        }

        Ok(Self { factor })
    }

    pub fn solve(&self, b: ArrayView1<'_, f64>) -> Array1<f64> {
        let rhs = DVector::from_iterator(b.len(), b.iter().copied());
        Array1::from_iter(self.factor.solve(&rhs).iter().copied())
    }
}

/// Top-`k` singular triplets `(U, s, Vt)` of `a`, `s` descending.
///
/// Ties in `s` keep the decomposition's column order.
pub fn top_singular_triplets(
    a: ArrayView2<'_, f64>,
    k: usize,
) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>)> {
    let (rows, cols) = a.dim();
    if k > rows.min(cols) {
        return Err(RecommenderError::InvalidRank {
            rank: k,
            limit: rows.min(cols),
        });
    }

    let svd = SVD::new(to_dmatrix(a), true, true);
    let u = svd
        .u
        .ok_or_else(|| RecommenderError::Decomposition("SVD failed to compute U".into()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| RecommenderError::Decomposition("SVD failed to compute V^T".into()))?;
    let sigma = svd.singular_values;

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&x, &y| sigma[y].total_cmp(&sigma[x]));
    order.truncate(k);

    let mut top_u = Array2::<f64>::zeros((rows, k));
    let mut top_vt = Array2::<f64>::zeros((k, cols));
    for (target, &source) in order.iter().enumerate() {
        for i in 0..rows {
            top_u[[i, target]] = u[(i, source)];
        }
        for j in 0..cols {
            top_vt[[target, j]] = v_t[(source, j)];
        }
    }
    let top_sigma = Array1::from_iter(order.iter().map(|&i| sigma[i]));

    Ok((top_u, top_sigma, top_vt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_solve() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let chol = CholeskySolver::factor(a.view()).unwrap();
        let x = chol.solve(b.view());
        let residual = a.dot(&x) - &b;
        assert!(residual.iter().all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = array![[0.0, 0.0], [0.0, 1.0]];
        assert!(matches!(
            CholeskySolver::factor(a.view()),
            Err(RecommenderError::SingularSystem)
        ));
        assert!(CholeskySolver::factor(Array2::<f64>::zeros((2, 3)).view()).is_err());
    }

    #[test]
    fn test_cholesky_rejects_rank_deficient_gram() {
        // Gram matrix of two identical columns
        let a = array![[2.0, 2.0], [2.0, 2.0]];
        assert!(matches!(
            CholeskySolver::factor(a.view()),
            Err(RecommenderError::SingularSystem)
        ));
    }

    #[test]
    fn test_dmatrix_conversion_keeps_layout() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let m = to_dmatrix(a.view());
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(0, 2)], 3.0);
    }

    #[test]
    fn test_triplets_sorted_descending() {
        let a = array![[0.5, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 1.0]];
        let (u, s, vt) = top_singular_triplets(a.view(), 2).unwrap();
        assert!((s[0] - 3.0).abs() < 1e-12);
        assert!((s[1] - 1.0).abs() < 1e-12);
        assert!((u[[1, 0]].abs() - 1.0).abs() < 1e-12);
        assert!((vt[[1, 2]].abs() - 1.0).abs() < 1e-12);
    }
}
