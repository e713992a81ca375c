//! Matrix Factorization using Alternating Least Squares (ALS)
//!
//! Alternates closed-form solves of the regularized normal equations:
//! every user row against fixed item factors, then every item row against
//! fixed user factors. Ratings are used as full dense rows, so unrated cells
//! contribute zero to the right-hand side and pull sparse rows toward zero.

use super::linalg::CholeskySolver;
use super::{check_rank, observed_mse, seeded_rng, FactorStrategy, Factorizer, LatentFactors};
use crate::error::Result;
use crate::matrix::PreparedMatrix;
use ndarray::{Array2, ArrayView2, Zip};
use rand::Rng;

/// ALS configuration parameters
#[derive(Debug, Clone)]
pub struct AlsConfig {
    /// Number of latent factors (embedding dimension)
    pub latent_factors: usize,
    /// Regularization parameter (lambda)
    pub regularization: f64,
    /// Number of iterations
    pub iterations: usize,
    pub seed: Option<u64>,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            latent_factors: 10,
            regularization: 0.02,
            iterations: 10,
            seed: None,
        }
    }
}

/// ALS-based matrix factorization
pub struct AlternatingLeastSquares {
    config: AlsConfig,
}

impl AlternatingLeastSquares {
    pub fn new(config: AlsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlsConfig {
        &self.config
    }

    /// Solve `(F^T F + lambda I) x = F^T r` for every row `r` of `ratings`,
    /// writing each `x` into the matching row of `target`.
    ///
    /// The system matrix is the same for every row, so it is factored once.
    fn solve_rows(
        target: &mut Array2<f64>,
        ratings: ArrayView2<'_, f64>,
        fixed: &Array2<f64>,
        lambda: f64,
    ) -> Result<()> {
        let mut gram = fixed.t().dot(fixed);
        for d in 0..gram.nrows() {
            gram[[d, d]] += lambda;
        }

        let cholesky = CholeskySolver::factor(gram.view())?;
        let rhs = ratings.dot(fixed);

        Zip::from(target.rows_mut())
            .and(rhs.rows())
            .par_for_each(|mut row, b| row.assign(&cholesky.solve(b)));

        Ok(())
    }
}

impl Factorizer for AlternatingLeastSquares {
    fn strategy(&self) -> FactorStrategy {
        FactorStrategy::AlternatingLeastSquares
    }

    fn factorize(&self, prepared: &PreparedMatrix) -> Result<LatentFactors> {
        let k = self.config.latent_factors;
        let ratings = prepared.ratings();
        check_rank(ratings, k)?;

        let (users, items) = ratings.shape();
        let ratings = ratings.values();
        let lambda = self.config.regularization;

        // Random initialization
        let mut rng = seeded_rng(self.config.seed);
        let mut user_factors = Array2::from_shape_fn((users, k), |_| rng.gen::<f64>());
        let mut item_factors = Array2::from_shape_fn((items, k), |_| rng.gen::<f64>());

        for iteration in 0..self.config.iterations {
            Self::solve_rows(&mut user_factors, ratings, &item_factors, lambda)?;
            Self::solve_rows(&mut item_factors, ratings.t(), &user_factors, lambda)?;

            tracing::debug!(
                "ALS iteration {}: mse = {:.4}",
                iteration,
                observed_mse(ratings, &user_factors, &item_factors.t().to_owned())
            );
        }

        LatentFactors::new(
            FactorStrategy::AlternatingLeastSquares,
            user_factors,
            item_factors.reversed_axes(),
        )
    }
}
