//! Matrix factorization by stochastic gradient descent
//!
//! Sweeps every observed cell once per iteration and nudges the matching user
//! row and item column against the prediction error. Runs a fixed number of
//! sweeps; convergence is not checked.

use super::{check_rank, observed_mse, seeded_rng, FactorStrategy, Factorizer, LatentFactors};
use crate::error::Result;
use crate::matrix::{PreparedMatrix, MISSING};
use ndarray::Array2;
use rand::Rng;

/// SGD configuration parameters
#[derive(Debug, Clone)]
pub struct SgdConfig {
    /// Number of latent factors
    pub latent_factors: usize,
    /// Step size
    pub learning_rate: f64,
    /// L2 penalty on both factor matrices
    pub regularization: f64,
    /// Number of full sweeps
    pub iterations: usize,
    pub seed: Option<u64>,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            latent_factors: 10,
            learning_rate: 0.0002,
            regularization: 0.02,
            iterations: 10,
            seed: None,
        }
    }
}

pub struct GradientDescent {
    config: SgdConfig,
}

impl GradientDescent {
    pub fn new(config: SgdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SgdConfig {
        &self.config
    }
}

impl Factorizer for GradientDescent {
    fn strategy(&self) -> FactorStrategy {
        FactorStrategy::GradientDescent
    }

    fn factorize(&self, prepared: &PreparedMatrix) -> Result<LatentFactors> {
        let k = self.config.latent_factors;
        let ratings = prepared.ratings();
        check_rank(ratings, k)?;

        let (users, items) = ratings.shape();
        let ratings = ratings.values();
        let learning_rate = self.config.learning_rate;
        let regularization = self.config.regularization;

        let mut rng = seeded_rng(self.config.seed);
        let mut user_factors = Array2::from_shape_fn((users, k), |_| rng.gen::<f64>());
        let mut item_factors_t = Array2::from_shape_fn((k, items), |_| rng.gen::<f64>());

        for iteration in 0..self.config.iterations {
            for u in 0..users {
                for i in 0..items {
                    let rating = ratings[[u, i]];
                    if rating == MISSING {
                        continue;
                    }

                    let error = rating - user_factors.row(u).dot(&item_factors_t.column(i));

                    for f in 0..k {
                        let user_value = user_factors[[u, f]];
                        let item_value = item_factors_t[[f, i]];
                        user_factors[[u, f]] +=
                            learning_rate * (2.0 * error * item_value - regularization * user_value);
                        item_factors_t[[f, i]] +=
                            learning_rate * (2.0 * error * user_value - regularization * item_value);
                    }
                }
            }

            tracing::debug!(
                "SGD iteration {}: mse = {:.4}",
                iteration,
                observed_mse(ratings, &user_factors, &item_factors_t)
            );
        }

        LatentFactors::new(FactorStrategy::GradientDescent, user_factors, item_factors_t)
    }
}
