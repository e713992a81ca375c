//! Truncated singular value decomposition
//!
//! Missing cells are treated as literal zeros before mean-centering, so the
//! decomposition also fits the unobserved entries. The full SVD of the
//! centered matrix is computed with `nalgebra` and only the top `k` singular
//! triplets are kept.

use super::linalg::top_singular_triplets;
use super::{check_rank, FactorStrategy, Factorizer, LatentFactors};
use crate::error::{RecommenderError, Result};
use crate::matrix::PreparedMatrix;

#[derive(Debug, Clone)]
pub struct SvdConfig {
    /// Number of singular triplets kept
    pub latent_factors: usize,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self { latent_factors: 10 }
    }
}

pub struct TruncatedSvd {
    config: SvdConfig,
}

impl TruncatedSvd {
    pub fn new(config: SvdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SvdConfig {
        &self.config
    }
}

impl Factorizer for TruncatedSvd {
    fn strategy(&self) -> FactorStrategy {
        FactorStrategy::TruncatedSvd
    }

    fn factorize(&self, prepared: &PreparedMatrix) -> Result<LatentFactors> {
        let k = self.config.latent_factors;
        let ratings = prepared.ratings();
        check_rank(ratings, k)?;

        let (users, items) = ratings.shape();
        let limit = users.min(items);
        if k >= limit {
            return Err(RecommenderError::InvalidRank { rank: k, limit });
        }

        let centered = prepared.deviations();
        let (u, sigma, vt) = top_singular_triplets(centered.view(), k)?;

        tracing::debug!(
            rank = k,
            largest = sigma.get(0).copied().unwrap_or(0.0),
            smallest = sigma.get(k - 1).copied().unwrap_or(0.0),
            "Truncated SVD complete"
        );

        LatentFactors::decomposition(u, sigma, vt, prepared.means().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RatingMatrix;
    use crate::types::Centering;
    use ndarray::{array, Array2};

    fn svd(k: usize) -> TruncatedSvd {
        TruncatedSvd::new(SvdConfig { latent_factors: k })
    }

    fn close_singular_values() -> Array2<f64> {
        array![
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.999, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.98, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.5, 0.0],
        ]
    }

    #[test]
    fn test_triplets_reconstruct_low_rank_matrix() {
        // rank 2
        let a = array![
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [2.0, 4.0, 6.0, 8.0, 10.0],
            [1.0, 0.0, 1.0, 0.0, 1.0],
            [3.0, 4.0, 7.0, 8.0, 11.0],
        ];
        let (u, s, vt) = top_singular_triplets(a.view(), 2).unwrap();

        assert!(s[0] >= s[1]);
        let mut scaled = u.clone();
        for j in 0..2 {
            let mut column = scaled.column_mut(j);
            column *= s[j];
        }
        let rebuilt = scaled.dot(&vt);
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            assert!((x - y).abs() < 1e-8);
        }

        // singular vectors are orthonormal
        let utu = u.t().dot(&u);
        let vvt = vt.dot(&vt.t());
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((utu[[i, j]] - expected).abs() < 1e-8);
                assert!((vvt[[i, j]] - expected).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_close_singular_values_pick_exact_top_k() {
        let a = close_singular_values();

        let (u, s, vt) = top_singular_triplets(a.view(), 1).unwrap();
        assert!((s[0] - 1.0).abs() < 1e-12);
        assert!((u[[0, 0]].abs() - 1.0).abs() < 1e-12);
        assert!((vt[[0, 0]].abs() - 1.0).abs() < 1e-12);
        let cell = u[[0, 0]] * s[0] * vt[[0, 0]];
        assert!((cell - 1.0).abs() < 1e-12);

        let (u, s, vt) = top_singular_triplets(a.view(), 3).unwrap();
        let expected = [1.0, 0.999, 0.98];
        for (j, sigma) in expected.iter().enumerate() {
            assert!((s[j] - sigma).abs() < 1e-12);
            assert!((u[[j, j]].abs() - 1.0).abs() < 1e-12);
            assert!((vt[[j, j]].abs() - 1.0).abs() < 1e-12);
        }
        // the 0.5 direction is not mixed in
        assert!(u.row(3).iter().all(|x| x.abs() < 1e-12));
        assert!(vt.column(3).iter().all(|x| x.abs() < 1e-12));
    }

    #[test]
    fn test_decomposition_is_deterministic() {
        let a = close_singular_values();
        let first = top_singular_triplets(a.view(), 2).unwrap();
        let second = top_singular_triplets(a.view(), 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tall_matrix() {
        let a = array![[3.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let (u, s, vt) = top_singular_triplets(a.view(), 1).unwrap();
        assert_eq!(u.dim(), (3, 1));
        assert_eq!(vt.dim(), (1, 2));
        assert!((s[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_factorize_predicts_on_rating_scale() {
        let ratings = RatingMatrix::from_array(array![
            [5.0, 4.0, 0.0, 1.0],
            [4.0, 5.0, 1.0, 0.0],
            [1.0, 0.0, 5.0, 4.0],
        ]);
        let prepared = PreparedMatrix::new(ratings.clone(), Centering::Raw);
        let factors = svd(2).factorize(&prepared).unwrap();

        assert_eq!(factors.strategy(), FactorStrategy::TruncatedSvd);
        assert_eq!(factors.rank(), 2);
        assert!(factors.row_offsets().is_some());

        let predictions = factors.predict();
        assert_eq!(predictions.shape(), ratings.shape());

        // Pre-centered and on-the-fly centered inputs decompose identically.
        let pre_centered = PreparedMatrix::new(ratings.clone(), Centering::MeanCentered);
        let again = svd(2).factorize(&pre_centered).unwrap().predict();
        for (x, y) in predictions.values().iter().zip(again.values().iter()) {
            assert!((x - y).abs() < 1e-8);
        }
    }

    #[test]
    fn test_factorize_keeps_leading_direction_of_close_spectrum() {
        let ratings = RatingMatrix::from_array(close_singular_values());
        let prepared = PreparedMatrix::new(ratings, Centering::Raw);
        let factors = svd(1).factorize(&prepared).unwrap();

        let centered = prepared.deviations();
        let (_, exact, _) = top_singular_triplets(centered.view(), 1).unwrap();
        let sigma = factors.singular_values().unwrap();
        assert!((sigma[0] - exact[0]).abs() < 1e-12);

        // Residual energy is the sum of the discarded squared singular values
        let (_, all, _) = top_singular_triplets(centered.view(), 4).unwrap();
        let optimal: f64 = all.iter().skip(1).map(|s| s * s).sum();
        let rebuilt = factors.predict();
        let ratings = prepared.ratings().values();
        let residual: f64 = rebuilt
            .values()
            .iter()
            .zip(ratings.iter())
            .map(|(p, r)| (p - r).powi(2))
            .sum();
        assert!((residual - optimal).abs() < 1e-10);
    }

    #[test]
    fn test_rank_one_reconstruction_recovers_ratings() {
        // second row is half the first, so the centered matrix has rank 1
        let ratings = RatingMatrix::from_array(array![[5.0, 0.0, 3.0], [2.5, 0.0, 1.5]]);
        let prepared = PreparedMatrix::new(ratings.clone(), Centering::Raw);
        let predictions = svd(1).factorize(&prepared).unwrap().predict();

        for (x, y) in predictions.values().iter().zip(ratings.values().iter()) {
            assert!((x - y).abs() < 1e-8);
        }
    }

    #[test]
    fn test_rank_must_be_below_smallest_dimension() {
        let ratings = RatingMatrix::from_array(array![[5.0, 0.0, 3.0], [0.0, 4.0, 0.0]]);
        let prepared = PreparedMatrix::new(ratings, Centering::Raw);

        assert!(matches!(
            svd(2).factorize(&prepared),
            Err(RecommenderError::InvalidRank { rank: 2, limit: 2 })
        ));
        assert!(matches!(
            svd(0).factorize(&prepared),
            Err(RecommenderError::DimensionMismatch(_))
        ));
    }
}
