//! Dense prediction matrix produced by every prediction path

use crate::error::Result;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::io::Write;

/// Predicted rating for every `(user, item)` cell, observed ones included.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionMatrix {
    values: Array2<f64>,
}

impl PredictionMatrix {
    pub fn from_array(values: Array2<f64>) -> Self {
        Self { values }
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

    pub fn get(&self, user: usize, item: usize) -> f64 {
        self.values[[user, item]]
    }

    pub fn user_row(&self, user: usize) -> ArrayView1<'_, f64> {
        self.values.row(user)
    }

    pub fn to_grid<W: Write>(&self, writer: W) -> Result<()> {
        crate::grid::write_grid(self.values.view(), writer)
    }
}
