//! Cosine similarity over matrix rows (users) or columns (items)

use crate::error::{RecommenderError, Result};
use crate::types::SimilarityAxis;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Square, symmetric pairwise similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    axis: SimilarityAxis,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    /// Pairwise cosine similarity of every row (`User`) or column (`Item`).
    ///
    /// Vectors with zero magnitude have similarity `0.0` with everything,
    /// themselves included.
    pub fn cosine(values: ArrayView2<'_, f64>, axis: SimilarityAxis) -> Self {
        let vectors = match axis {
            SimilarityAxis::User => values,
            SimilarityAxis::Item => values.reversed_axes(),
        };

        let mut normalized = vectors.to_owned();
        let mut undefined = 0usize;
        for mut row in normalized.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            } else {
                undefined += 1;
            }
        }

        if undefined > 0 {
            tracing::debug!(
                "{} of {} {} vectors have zero magnitude; similarity set to 0",
                undefined,
                normalized.nrows(),
                axis
            );
        }

        let product = normalized.dot(&normalized.t());
        let values = (&product + &product.t()) * 0.5;

        Self { axis, values }
    }

    /// Wrap a precomputed square matrix.
    pub fn from_array(values: Array2<f64>, axis: SimilarityAxis) -> Result<Self> {
        if values.nrows() != values.ncols() {
            return Err(RecommenderError::dimension_mismatch(format!(
                "similarity matrix must be square, got {}x{}",
                values.nrows(),
                values.ncols()
            )));
        }
        Ok(Self { axis, values })
    }

    pub fn axis(&self) -> SimilarityAxis {
        self.axis
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[[a, b]]
    }
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecommenderError::dimension_mismatch(format!(
            "vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }

    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(RecommenderError::UndefinedSimilarity);
    }

    Ok(a.dot(&b) / (norm_a * norm_b))
}
