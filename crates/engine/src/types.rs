//! Shared value types for the recommendation engine

use crate::error::RecommenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One observed rating, with dense zero-based indices assigned upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_index: usize,
    pub item_index: usize,
    pub value: f64,
    pub item_label: String,
}

impl RatingRecord {
    pub fn new(user_index: usize, item_index: usize, value: f64, item_label: impl Into<String>) -> Self {
        Self {
            user_index,
            item_index,
            value,
            item_label: item_label.into(),
        }
    }
}

/// Which vectors a similarity matrix compares: rows (users) or columns (items).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityAxis {
    User,
    Item,
}

impl FromStr for SimilarityAxis {
    type Err = RecommenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "item" => Ok(Self::Item),
            other => Err(RecommenderError::configuration(
                format!("unknown similarity axis '{}'", other),
                "TAPROOM_SIMILARITY_AXIS",
            )),
        }
    }
}

impl fmt::Display for SimilarityAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Item => write!(f, "item"),
        }
    }
}

/// Whether the training values were mean-centered once, up front.
///
/// Carried explicitly from matrix preparation into every predictor so the
/// row mean is removed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Centering {
    Raw,
    MeanCentered,
}

impl Centering {
    pub fn from_flag(mean_centering: bool) -> Self {
        if mean_centering {
            Self::MeanCentered
        } else {
            Self::Raw
        }
    }
}

/// Prediction path selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    NeighborhoodUser,
    NeighborhoodItem,
    FactorSvd,
    FactorSgd,
    FactorAls,
}

impl Algorithm {
    pub fn neighborhood(axis: SimilarityAxis) -> Self {
        match axis {
            SimilarityAxis::User => Self::NeighborhoodUser,
            SimilarityAxis::Item => Self::NeighborhoodItem,
        }
    }

    /// Axis a neighbourhood algorithm computes similarity along
    pub fn similarity_axis(&self) -> Option<SimilarityAxis> {
        match self {
            Self::NeighborhoodUser => Some(SimilarityAxis::User),
            Self::NeighborhoodItem => Some(SimilarityAxis::Item),
            _ => None,
        }
    }

    pub fn is_factorization(&self) -> bool {
        matches!(self, Self::FactorSvd | Self::FactorSgd | Self::FactorAls)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NeighborhoodUser => "user-user",
            Self::NeighborhoodItem => "item-item",
            Self::FactorSvd => "svd",
            Self::FactorSgd => "sgd",
            Self::FactorAls => "als",
        }
    }
}

impl FromStr for Algorithm {
    type Err = RecommenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user-user" | "user" => Ok(Self::NeighborhoodUser),
            "item-item" | "item" => Ok(Self::NeighborhoodItem),
            "svd" => Ok(Self::FactorSvd),
            "sgd" => Ok(Self::FactorSgd),
            "als" => Ok(Self::FactorAls),
            other => Err(RecommenderError::configuration(
                format!("unknown algorithm '{}'", other),
                "TAPROOM_ALGORITHM",
            )),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accuracy metric reported by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorMetric {
    Rmse,
    Mse,
}
