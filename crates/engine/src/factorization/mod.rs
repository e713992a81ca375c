//! Latent factor models
//!
//! Three interchangeable strategies decompose the training ratings into user
//! factors `U (users x k)` and transposed item factors `Vt (k x items)`:
//!
//! - [`TruncatedSvd`]: top-`k` singular triplets of the mean-centered matrix
//! - [`GradientDescent`]: stochastic gradient descent on observed cells
//! - [`AlternatingLeastSquares`]: regularized closed-form row solves
//!
//! Decomposition output carries the row means it removed and adds them back
//! when predicting; the iterative strategies train on raw ratings and never
//! apply a mean term.

pub mod als;
pub mod linalg;
pub mod sgd;
pub mod svd;

pub use als::{AlsConfig, AlternatingLeastSquares};
pub use sgd::{GradientDescent, SgdConfig};
pub use svd::{SvdConfig, TruncatedSvd};

use crate::error::{RecommenderError, Result};
use crate::matrix::{PreparedMatrix, RatingMatrix};
use crate::prediction::PredictionMatrix;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Strategy that produced a set of latent factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorStrategy {
    TruncatedSvd,
    GradientDescent,
    AlternatingLeastSquares,
}

/// Common contract of the factorization strategies
pub trait Factorizer {
    fn strategy(&self) -> FactorStrategy;

    /// Decompose the prepared training matrix. All-or-nothing: on error no
    /// partial factors are produced.
    fn factorize(&self, prepared: &PreparedMatrix) -> Result<LatentFactors>;
}

/// Learned user and item factors
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactors {
    strategy: FactorStrategy,
    /// users x k
    user_factors: Array2<f64>,
    /// k, decomposition only
    singular_values: Option<Array1<f64>>,
    /// k x items
    item_factors_t: Array2<f64>,
    /// Row means removed before decomposition
    row_offsets: Option<Array1<f64>>,
}

impl LatentFactors {
    /// Factors from an iterative strategy: prediction is `U * Vt`.
    pub fn new(
        strategy: FactorStrategy,
        user_factors: Array2<f64>,
        item_factors_t: Array2<f64>,
    ) -> Result<Self> {
        check_inner_dimension(&user_factors, &item_factors_t)?;
        Ok(Self {
            strategy,
            user_factors,
            singular_values: None,
            item_factors_t,
            row_offsets: None,
        })
    }

    /// Factors from a decomposition: prediction is `U * diag(s) * Vt + means`.
    pub fn decomposition(
        user_factors: Array2<f64>,
        singular_values: Array1<f64>,
        item_factors_t: Array2<f64>,
        row_offsets: Array1<f64>,
    ) -> Result<Self> {
        check_inner_dimension(&user_factors, &item_factors_t)?;
        if singular_values.len() != user_factors.ncols() {
            return Err(RecommenderError::dimension_mismatch(format!(
                "{} singular values for rank {}",
                singular_values.len(),
                user_factors.ncols()
            )));
        }
        if row_offsets.len() != user_factors.nrows() {
            return Err(RecommenderError::dimension_mismatch(format!(
                "{} row offsets for {} users",
                row_offsets.len(),
                user_factors.nrows()
            )));
        }
        Ok(Self {
            strategy: FactorStrategy::TruncatedSvd,
            user_factors,
            singular_values: Some(singular_values),
            item_factors_t,
            row_offsets: Some(row_offsets),
        })
    }

    pub fn strategy(&self) -> FactorStrategy {
        self.strategy
    }

    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }

    pub fn user_factors(&self) -> ArrayView2<'_, f64> {
        self.user_factors.view()
    }

    pub fn item_factors_t(&self) -> ArrayView2<'_, f64> {
        self.item_factors_t.view()
    }

    pub fn singular_values(&self) -> Option<ArrayView1<'_, f64>> {
        self.singular_values.as_ref().map(|s| s.view())
    }

    pub fn row_offsets(&self) -> Option<ArrayView1<'_, f64>> {
        self.row_offsets.as_ref().map(|m| m.view())
    }

    /// Reconstruct a full prediction matrix.
    pub fn predict(&self) -> PredictionMatrix {
        let mut predictions = match &self.singular_values {
            Some(sigma) => {
                let mut scaled = self.user_factors.clone();
                for (mut column, s) in scaled.axis_iter_mut(Axis(1)).zip(sigma.iter()) {
                    column *= *s;
                }
                scaled.dot(&self.item_factors_t)
            }
            None => self.user_factors.dot(&self.item_factors_t),
        };

        if let Some(offsets) = &self.row_offsets {
            for (mut row, offset) in predictions.axis_iter_mut(Axis(0)).zip(offsets.iter()) {
                row += *offset;
            }
        }

        PredictionMatrix::from_array(predictions)
    }
}

fn check_inner_dimension(user_factors: &Array2<f64>, item_factors_t: &Array2<f64>) -> Result<()> {
    if user_factors.ncols() != item_factors_t.nrows() {
        return Err(RecommenderError::dimension_mismatch(format!(
            "user factors have rank {}, item factors have rank {}",
            user_factors.ncols(),
            item_factors_t.nrows()
        )));
    }
    Ok(())
}

/// Shared precondition: positive rank and a non-empty matrix.
pub(crate) fn check_rank(ratings: &RatingMatrix, latent_factors: usize) -> Result<()> {
    if latent_factors == 0 {
        return Err(RecommenderError::dimension_mismatch(
            "latent factor count must be positive",
        ));
    }
    if ratings.is_empty() {
        let (users, items) = ratings.shape();
        return Err(RecommenderError::dimension_mismatch(format!(
            "cannot factorize an empty {}x{} matrix",
            users, items
        )));
    }
    Ok(())
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Mean squared error of `U * Vt` over observed cells.
pub(crate) fn observed_mse(
    ratings: ArrayView2<'_, f64>,
    user_factors: &Array2<f64>,
    item_factors_t: &Array2<f64>,
) -> f64 {
    let mut loss = 0.0;
    let mut count = 0usize;

    for ((u, i), &rating) in ratings.indexed_iter() {
        if rating == crate::matrix::MISSING {
            continue;
        }
        let prediction = user_factors.row(u).dot(&item_factors_t.column(i));
        loss += (rating - prediction).powi(2);
        count += 1;
    }

    if count > 0 {
        loss / count as f64
    } else {
        0.0
    }
}
