//! Per-user ranked recommendation lists
//!
//! Splits one user's items into those already rated and those not yet rated,
//! ranks the unrated ones by predicted score, and renders both lists as
//! `label::score` lines.

use crate::error::{RecommenderError, Result};
use crate::matrix::{ItemLabels, RatingMatrix, MISSING};
use crate::prediction::PredictionMatrix;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

/// Number of already-rated entries rendered per user
pub const RATED_LINE_LIMIT: usize = 20;

/// Separator between rendered entries
pub const DEFAULT_DELIMITER: &str = "\t";

/// One ranked item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub index: usize,
    pub label: String,
    pub score: f64,
}

impl fmt::Display for ScoredItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{:.1}", self.label, self.score)
    }
}

/// Rated and recommended items for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub user: usize,
    /// Observed ratings, highest first
    pub rated: Vec<ScoredItem>,
    /// Unrated items by predicted score, highest first, at most `top_n`
    pub recommended: Vec<ScoredItem>,
}

impl Ranking {
    pub fn recommended_line(&self, delimiter: &str) -> String {
        render_line(&self.recommended, self.recommended.len(), delimiter)
    }

    pub fn rated_line(&self, delimiter: &str) -> String {
        render_line(&self.rated, RATED_LINE_LIMIT, delimiter)
    }
}

/// Rank one user's items.
///
/// Ties in score are broken by ascending item index.
pub fn rank(
    predictions: &PredictionMatrix,
    ratings: &RatingMatrix,
    user: usize,
    top_n: usize,
    labels: &ItemLabels,
) -> Result<Ranking> {
    if predictions.shape() != ratings.shape() {
        return Err(RecommenderError::dimension_mismatch(format!(
            "predictions are {:?}, ratings are {:?}",
            predictions.shape(),
            ratings.shape()
        )));
    }
    if user >= ratings.num_users() {
        return Err(RecommenderError::IndexOutOfRange {
            axis: "user",
            index: user,
            bound: ratings.num_users(),
        });
    }

    let observed = ratings.values();
    let observed = observed.row(user);
    let predicted = predictions.user_row(user);

    let mut rated = Vec::new();
    let mut candidates = Vec::new();
    for (index, (&rating, &score)) in observed.iter().zip(predicted.iter()).enumerate() {
        if rating != MISSING {
            rated.push((index, rating));
        } else {
            candidates.push((index, score));
        }
    }

    rated.sort_by(by_score_then_index);
    candidates.sort_by(by_score_then_index);
    candidates.truncate(top_n);

    let scored = |(index, score): (usize, f64)| ScoredItem {
        index,
        label: labels.label_or_index(index),
        score,
    };

    Ok(Ranking {
        user,
        rated: rated.into_iter().map(scored).collect(),
        recommended: candidates.into_iter().map(scored).collect(),
    })
}

fn by_score_then_index(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

/// Join the first `limit` entries as `label::score`.
pub fn render_line(items: &[ScoredItem], limit: usize, delimiter: &str) -> String {
    items
        .iter()
        .take(limit)
        .map(ScoredItem::to_string)
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Write one recommendation line per ranking.
pub fn write_recommendations<W: Write>(
    rankings: &[Ranking],
    delimiter: &str,
    mut writer: W,
) -> Result<()> {
    for ranking in rankings {
        writeln!(writer, "{}", ranking.recommended_line(delimiter))?;
    }
    Ok(())
}

/// Write one already-rated line per ranking, top entries only.
pub fn write_rated<W: Write>(rankings: &[Ranking], delimiter: &str, mut writer: W) -> Result<()> {
    for ranking in rankings {
        writeln!(writer, "{}", ranking.rated_line(delimiter))?;
    }
    Ok(())
}
