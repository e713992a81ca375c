//! Neighborhood-based collaborative filtering
//!
//! Weighted averages over similar users or similar items:
//!
//! - user-based: `p[u,i] = mean[u] + Σ_v s[u,v]·(r[v,i] − mean[v]) / Σ_v |s[u,v]|`
//! - item-based: `p[u,i] = Σ_j s[i,j]·r[u,j] / Σ_j |s[i,j]|`
//!
//! A row of similarities that sums to zero in absolute value carries no
//! neighbour information. The weighted term is then `0.0`, so the user-based
//! prediction falls back to the user's mean and the item-based prediction to
//! `0.0` ("no prediction available").

use crate::error::{RecommenderError, Result};
use crate::matrix::{PreparedMatrix, RatingMatrix};
use crate::prediction::PredictionMatrix;
use crate::similarity::SimilarityMatrix;
use crate::types::SimilarityAxis;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// User-based prediction.
///
/// Deviations come from the prepared matrix: taken as-is when it was
/// mean-centered up front, computed here otherwise.
pub fn predict_user_based(
    prepared: &PreparedMatrix,
    similarity: &SimilarityMatrix,
) -> Result<PredictionMatrix> {
    let (users, _) = prepared.ratings().shape();
    check_similarity(similarity, SimilarityAxis::User, users)?;

    let sim = similarity.values();
    let deviations = prepared.deviations();
    let weights = abs_row_sums(sim);

    let mut predictions = sim.dot(&deviations);
    for ((mut row, weight), mean) in predictions
        .axis_iter_mut(Axis(0))
        .zip(weights.iter())
        .zip(prepared.means().iter())
    {
        if *weight > 0.0 {
            row /= *weight;
        } else {
            row.fill(0.0);
        }
        row += *mean;
    }

    tracing::debug!(
        users,
        isolated = weights.iter().filter(|w| **w == 0.0).count(),
        centering = ?prepared.centering(),
        "User-based predictions computed"
    );

    Ok(PredictionMatrix::from_array(predictions))
}

/// Item-based prediction on raw ratings, no mean term.
pub fn predict_item_based(
    ratings: &RatingMatrix,
    similarity: &SimilarityMatrix,
) -> Result<PredictionMatrix> {
    let (_, items) = ratings.shape();
    check_similarity(similarity, SimilarityAxis::Item, items)?;

    let sim = similarity.values();
    let weights = abs_row_sums(sim);

    let mut predictions: Array2<f64> = ratings.values().dot(&sim.t());
    for (mut column, weight) in predictions.axis_iter_mut(Axis(1)).zip(weights.iter()) {
        if *weight > 0.0 {
            column /= *weight;
        } else {
            column.fill(0.0);
        }
    }

    tracing::debug!(
        items,
        isolated = weights.iter().filter(|w| **w == 0.0).count(),
        "Item-based predictions computed"
    );

    Ok(PredictionMatrix::from_array(predictions))
}

fn abs_row_sums(sim: ArrayView2<'_, f64>) -> Array1<f64> {
    sim.mapv(f64::abs).sum_axis(Axis(1))
}

fn check_similarity(
    similarity: &SimilarityMatrix,
    axis: SimilarityAxis,
    expected: usize,
) -> Result<()> {
    if similarity.len() != expected {
        return Err(RecommenderError::dimension_mismatch(format!(
            "{} similarity has {} rows, ratings have {} {}s",
            axis,
            similarity.len(),
            expected,
            axis
        )));
    }
    if similarity.axis() != axis {
        return Err(RecommenderError::dimension_mismatch(format!(
            "expected {} similarity, got {}",
            axis,
            similarity.axis()
        )));
    }
    Ok(())
}
