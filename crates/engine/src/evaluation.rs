//! Prediction accuracy against held-out ratings

use crate::error::{RecommenderError, Result};
use crate::matrix::{RatingMatrix, MISSING};
use crate::prediction::PredictionMatrix;
use crate::types::ErrorMetric;
use ndarray::Zip;

/// Score `predictions` on the observed (non-zero) cells of `test`.
pub fn evaluate(
    predictions: &PredictionMatrix,
    test: &RatingMatrix,
    metric: ErrorMetric,
) -> Result<f64> {
    if predictions.shape() != test.shape() {
        return Err(RecommenderError::dimension_mismatch(format!(
            "predictions are {:?}, test matrix is {:?}",
            predictions.shape(),
            test.shape()
        )));
    }

    let mut squared_error = 0.0;
    let mut count = 0usize;
    Zip::from(predictions.values())
        .and(test.values())
        .for_each(|&predicted, &actual| {
            if actual != MISSING {
                squared_error += (predicted - actual).powi(2);
                count += 1;
            }
        });

    if count == 0 {
        return Err(RecommenderError::EmptyTestSet);
    }

    let mse = squared_error / count as f64;
    Ok(match metric {
        ErrorMetric::Mse => mse,
        ErrorMetric::Rmse => mse.sqrt(),
    })
}
