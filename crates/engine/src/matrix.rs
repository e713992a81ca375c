//! Dense user-item rating matrix
//!
//! Builds the `users x items` matrix from rating records. A cell value of
//! `0.0` means "no rating recorded"; a true rating of zero cannot be told
//! apart from a missing one anywhere downstream.

use crate::error::{RecommenderError, Result};
use crate::types::{Centering, RatingRecord};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Sentinel stored in cells without a rating
pub const MISSING: f64 = 0.0;

/// Item index to display label, append-only, last writer wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemLabels {
    labels: BTreeMap<usize, String>,
}

impl ItemLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_index: usize, label: impl Into<String>) {
        self.labels.insert(item_index, label.into());
    }

    pub fn get(&self, item_index: usize) -> Option<&str> {
        self.labels.get(&item_index).map(String::as_str)
    }

    /// Label for display, falling back to the decimal index.
    pub fn label_or_index(&self, item_index: usize) -> String {
        self.get(item_index)
            .map(str::to_string)
            .unwrap_or_else(|| item_index.to_string())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(index, label)| (*index, label.as_str()))
    }
}

/// Dense `users x items` ratings
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    values: Array2<f64>,
}

impl RatingMatrix {
    /// Build the matrix from records, recording item labels along the way.
    ///
    /// Every record is validated before anything is written, so a bad index
    /// leaves `labels` untouched.
    pub fn build(
        records: &[RatingRecord],
        total_users: usize,
        total_items: usize,
        labels: &mut ItemLabels,
    ) -> Result<Self> {
        for record in records {
            if record.user_index >= total_users {
                return Err(RecommenderError::IndexOutOfRange {
                    axis: "user",
                    index: record.user_index,
                    bound: total_users,
                });
            }
            if record.item_index >= total_items {
                return Err(RecommenderError::IndexOutOfRange {
                    axis: "item",
                    index: record.item_index,
                    bound: total_items,
                });
            }
        }

        let mut values = Array2::<f64>::zeros((total_users, total_items));
        for record in records {
            values[[record.user_index, record.item_index]] = record.value;
            labels.insert(record.item_index, record.item_label.clone());
        }

        Ok(Self { values })
    }

    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
    }

    /// Load a previously written whitespace-delimited grid.
    pub fn from_grid<R: BufRead>(reader: R) -> Result<Self> {
        Ok(Self::from_array(crate::grid::read_grid(reader)?))
    }

    pub fn to_grid<W: Write>(&self, writer: W) -> Result<()> {
        crate::grid::write_grid(self.values.view(), writer)
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn num_users(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, user: usize, item: usize) -> f64 {
        self.values[[user, item]]
    }

    /// Number of non-sentinel cells
    pub fn observed_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != MISSING).count()
    }

    /// Fraction of cells holding a rating
    pub fn density(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.observed_count() as f64 / self.values.len() as f64
    }

    /// Fraction of cells with no rating
    pub fn sparsity(&self) -> f64 {
        if self.values.is_empty() {
            return 1.0;
        }
        1.0 - self.density()
    }

    /// Per-row mean over every declared item slot, sentinel zeros included.
    pub fn row_means(&self) -> Array1<f64> {
        if self.values.ncols() == 0 {
            return Array1::zeros(self.values.nrows());
        }
        self.values.sum_axis(Axis(1)) / self.values.ncols() as f64
    }
}

/// Training ratings together with their row means and centering state.
#[derive(Debug, Clone)]
pub struct PreparedMatrix {
    ratings: RatingMatrix,
    means: Array1<f64>,
    centered: Option<Array2<f64>>,
}

impl PreparedMatrix {
    pub fn new(ratings: RatingMatrix, centering: Centering) -> Self {
        let means = ratings.row_means();
        let centered = match centering {
            Centering::Raw => None,
            Centering::MeanCentered => {
                let mut values = ratings.values.clone();
                subtract_row_means(&mut values, &means);
                Some(values)
            }
        };

        Self {
            ratings,
            means,
            centered,
        }
    }

    pub fn centering(&self) -> Centering {
        if self.centered.is_some() {
            Centering::MeanCentered
        } else {
            Centering::Raw
        }
    }

    pub fn ratings(&self) -> &RatingMatrix {
        &self.ratings
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    /// Values similarity is computed on: centered when prepared that way.
    pub fn working_values(&self) -> ArrayView2<'_, f64> {
        match &self.centered {
            Some(values) => values.view(),
            None => self.ratings.values(),
        }
    }

    /// Deviations from the row mean, subtracting it here only when the
    /// values were not centered up front.
    pub fn deviations(&self) -> Array2<f64> {
        match &self.centered {
            Some(values) => values.clone(),
            None => {
                let mut values = self.ratings.values.clone();
                subtract_row_means(&mut values, &self.means);
                values
            }
        }
    }
}

fn subtract_row_means(values: &mut Array2<f64>, means: &Array1<f64>) {
    for (mut row, mean) in values.axis_iter_mut(Axis(0)).zip(means.iter()) {
        row -= *mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn records() -> Vec<RatingRecord> {
        vec![
            RatingRecord::new(0, 0, 5.0, "Pliny"),
            RatingRecord::new(0, 2, 3.0, "Heady Topper"),
            RatingRecord::new(1, 1, 4.0, "Zombie Dust"),
        ]
    }

    #[test]
    fn test_build_places_every_record() {
        let mut labels = ItemLabels::new();
        let matrix = RatingMatrix::build(&records(), 2, 3, &mut labels).unwrap();

        assert_eq!(matrix.shape(), (2, 3));
        for record in records() {
            assert_eq!(matrix.get(record.user_index, record.item_index), record.value);
        }
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert_eq!(matrix.get(1, 2), 0.0);
        assert_eq!(labels.get(1), Some("Zombie Dust"));
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn test_build_rejects_out_of_range_without_side_effects() {
        let mut labels = ItemLabels::new();
        let mut bad = records();
        bad.push(RatingRecord::new(0, 3, 2.0, "Ghost"));

        let err = RatingMatrix::build(&bad, 2, 3, &mut labels).unwrap_err();
        assert!(matches!(
            err,
            RecommenderError::IndexOutOfRange {
                axis: "item",
                index: 3,
                bound: 3
            }
        ));
        assert!(labels.is_empty());

        let err = RatingMatrix::build(&[RatingRecord::new(2, 0, 1.0, "x")], 2, 3, &mut labels)
            .unwrap_err();
        assert!(matches!(err, RecommenderError::IndexOutOfRange { axis: "user", .. }));
    }

    #[test]
    fn test_label_last_writer_wins() {
        let mut labels = ItemLabels::new();
        let records = vec![
            RatingRecord::new(0, 0, 5.0, "first"),
            RatingRecord::new(1, 0, 4.0, "second"),
        ];
        RatingMatrix::build(&records, 2, 1, &mut labels).unwrap();
        assert_eq!(labels.get(0), Some("second"));
        assert_eq!(labels.label_or_index(7), "7");
    }

    #[test]
    fn test_row_means_include_missing_cells() {
        let matrix = RatingMatrix::from_array(array![[5.0, 0.0, 3.0], [0.0, 4.0, 0.0]]);
        let means = matrix.row_means();
        assert!((means[0] - 8.0 / 3.0).abs() < 1e-12);
        assert!((means[1] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sparsity() {
        let matrix = RatingMatrix::from_array(array![[5.0, 0.0, 3.0], [0.0, 4.0, 0.0]]);
        assert_eq!(matrix.observed_count(), 3);
        assert!((matrix.density() - 0.5).abs() < 1e-12);
        assert!((matrix.sparsity() - 0.5).abs() < 1e-12);
        assert_eq!(RatingMatrix::from_array(Array2::zeros((0, 0))).sparsity(), 1.0);
    }

    #[test]
    fn test_prepared_matrix_centers_once() {
        let matrix = RatingMatrix::from_array(array![[5.0, 0.0, 3.0], [0.0, 4.0, 0.0]]);

        let raw = PreparedMatrix::new(matrix.clone(), Centering::Raw);
        let centered = PreparedMatrix::new(matrix, Centering::MeanCentered);

        assert_eq!(raw.centering(), Centering::Raw);
        assert_eq!(centered.centering(), Centering::MeanCentered);
        assert_eq!(raw.working_values()[[0, 0]], 5.0);
        assert!((centered.working_values()[[0, 0]] - (5.0 - 8.0 / 3.0)).abs() < 1e-12);

        // Both paths must agree on deviations: one subtraction, never two.
        let a = raw.deviations();
        let b = centered.deviations();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
        assert_eq!(centered.ratings().get(0, 0), 5.0);
    }
}
