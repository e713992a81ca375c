//! Taproom Recommendation Engine
//!
//! Collaborative filtering over a dense user-item rating matrix: cosine
//! neighbourhood prediction, latent factor models (truncated SVD, SGD, ALS),
//! held-out evaluation and per-user ranked recommendation lists.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod factorization;
pub mod grid;
pub mod matrix;
pub mod neighborhood;
pub mod prediction;
pub mod ranking;
pub mod recommender;
pub mod similarity;
pub mod telemetry;
pub mod types;

// Re-export key types
pub use config::{ConfigLoader, RecommenderConfig};
pub use error::{RecommenderError, Result};
pub use evaluation::evaluate;
pub use factorization::{
    AlsConfig, AlternatingLeastSquares, FactorStrategy, Factorizer, GradientDescent,
    LatentFactors, SgdConfig, SvdConfig, TruncatedSvd,
};
pub use matrix::{ItemLabels, PreparedMatrix, RatingMatrix, MISSING};
pub use neighborhood::{predict_item_based, predict_user_based};
pub use prediction::PredictionMatrix;
pub use ranking::{rank, Ranking, ScoredItem};
pub use recommender::Recommender;
pub use similarity::{cosine_similarity, SimilarityMatrix};
pub use telemetry::{init_tracing, TelemetryError, TracingConfig};
pub use types::*;
