//! Recommendation pipeline
//!
//! Owns one training matrix and one held-out testing matrix and runs the
//! build → similarity/factorize → predict → evaluate → rank flow over them.
//! Each call's output replaces the previous one only after it succeeds.

use crate::config::{ConfigLoader, RecommenderConfig};
use crate::error::{RecommenderError, Result};
use crate::evaluation;
use crate::factorization::{
    AlternatingLeastSquares, FactorStrategy, Factorizer, GradientDescent, LatentFactors,
    TruncatedSvd,
};
use crate::matrix::{ItemLabels, PreparedMatrix, RatingMatrix};
use crate::neighborhood;
use crate::prediction::PredictionMatrix;
use crate::ranking::{self, Ranking};
use crate::similarity::SimilarityMatrix;
use crate::types::{Algorithm, ErrorMetric, RatingRecord, SimilarityAxis};
use std::time::Instant;
use tracing::{debug, info};

/// Collaborative filtering engine
pub struct Recommender {
    config: RecommenderConfig,
    labels: ItemLabels,
    training: PreparedMatrix,
    testing: RatingMatrix,
    similarity: Option<SimilarityMatrix>,
    factors: Option<LatentFactors>,
    predictions: Option<PredictionMatrix>,
    predicted_with: Option<Algorithm>,
}

impl Recommender {
    /// Build training and testing matrices from records.
    ///
    /// Labels are collected from both record sets.
    pub fn new(
        training: &[RatingRecord],
        testing: &[RatingRecord],
        total_users: usize,
        total_items: usize,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut labels = ItemLabels::new();
        let training = RatingMatrix::build(training, total_users, total_items, &mut labels)?;
        let testing = RatingMatrix::build(testing, total_users, total_items, &mut labels)?;

        Ok(Self::assemble(training, testing, labels, config))
    }

    /// Start from previously serialized matrices.
    pub fn from_matrices(
        training: RatingMatrix,
        testing: RatingMatrix,
        labels: ItemLabels,
        config: RecommenderConfig,
    ) -> Result<Self> {
        config.validate()?;

        if training.shape() != testing.shape() {
            return Err(RecommenderError::dimension_mismatch(format!(
                "training matrix is {:?}, testing matrix is {:?}",
                training.shape(),
                testing.shape()
            )));
        }

        Ok(Self::assemble(training, testing, labels, config))
    }

    fn assemble(
        training: RatingMatrix,
        testing: RatingMatrix,
        labels: ItemLabels,
        config: RecommenderConfig,
    ) -> Self {
        let (users, items) = training.shape();
        info!(
            users,
            items,
            training_ratings = training.observed_count(),
            testing_ratings = testing.observed_count(),
            sparsity = training.sparsity(),
            "Rating matrices built"
        );

        let training = PreparedMatrix::new(training, config.centering());

        Self {
            config,
            labels,
            training,
            testing,
            similarity: None,
            factors: None,
            predictions: None,
            predicted_with: None,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn labels(&self) -> &ItemLabels {
        &self.labels
    }

    pub fn training(&self) -> &PreparedMatrix {
        &self.training
    }

    pub fn testing(&self) -> &RatingMatrix {
        &self.testing
    }

    pub fn latest_similarity(&self) -> Option<&SimilarityMatrix> {
        self.similarity.as_ref()
    }

    pub fn factors(&self) -> Option<&LatentFactors> {
        self.factors.as_ref()
    }

    pub fn predictions(&self) -> Option<&PredictionMatrix> {
        self.predictions.as_ref()
    }

    /// Algorithm that produced the current predictions
    pub fn predicted_with(&self) -> Option<Algorithm> {
        self.predicted_with
    }

    /// Cosine similarity along `axis` of the training matrix.
    pub fn similarity(&mut self, axis: SimilarityAxis) -> &SimilarityMatrix {
        let similarity = self.compute_similarity(axis);
        self.similarity.insert(similarity)
    }

    fn compute_similarity(&self, axis: SimilarityAxis) -> SimilarityMatrix {
        let started = Instant::now();
        let similarity = SimilarityMatrix::cosine(self.training.working_values(), axis);
        info!(
            axis = %axis,
            size = similarity.len(),
            centering = ?self.training.centering(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Similarity computed"
        );
        similarity
    }

    fn take_similarity(&mut self, axis: SimilarityAxis) -> SimilarityMatrix {
        match self.similarity.take() {
            Some(similarity) if similarity.axis() == axis => similarity,
            _ => self.compute_similarity(axis),
        }
    }

    fn factorizer(&self, strategy: FactorStrategy) -> Box<dyn Factorizer> {
        match strategy {
            FactorStrategy::TruncatedSvd => Box::new(TruncatedSvd::new(self.config.svd())),
            FactorStrategy::GradientDescent => Box::new(GradientDescent::new(self.config.sgd())),
            FactorStrategy::AlternatingLeastSquares => {
                Box::new(AlternatingLeastSquares::new(self.config.als()))
            }
        }
    }

    /// Learn latent factors with `strategy`.
    ///
    /// Previously stored factors survive a failed run.
    pub fn factorize(&mut self, strategy: FactorStrategy) -> Result<&LatentFactors> {
        let started = Instant::now();
        let factors = self.factorizer(strategy).factorize(&self.training)?;

        info!(
            strategy = ?strategy,
            rank = factors.rank(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Factorization complete"
        );

        Ok(self.factors.insert(factors))
    }

    /// Fill a prediction for every cell with `algorithm`.
    pub fn predict(&mut self, algorithm: Algorithm) -> Result<&PredictionMatrix> {
        let started = Instant::now();

        let predictions = match algorithm {
            Algorithm::NeighborhoodUser => {
                let similarity = self.take_similarity(SimilarityAxis::User);
                let result = neighborhood::predict_user_based(&self.training, &similarity);
                self.similarity = Some(similarity);
                result?
            }
            Algorithm::NeighborhoodItem => {
                let similarity = self.take_similarity(SimilarityAxis::Item);
                let result =
                    neighborhood::predict_item_based(self.training.ratings(), &similarity);
                self.similarity = Some(similarity);
                result?
            }
            Algorithm::FactorSvd => self.factorize(FactorStrategy::TruncatedSvd)?.predict(),
            Algorithm::FactorSgd => self.factorize(FactorStrategy::GradientDescent)?.predict(),
            Algorithm::FactorAls => self
                .factorize(FactorStrategy::AlternatingLeastSquares)?
                .predict(),
        };

        info!(
            algorithm = %algorithm,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Predictions computed"
        );

        self.predicted_with = Some(algorithm);
        Ok(self.predictions.insert(predictions))
    }

    /// Score the current predictions against the testing matrix.
    pub fn evaluate(&self, metric: ErrorMetric) -> Result<f64> {
        let predictions = self
            .predictions
            .as_ref()
            .ok_or(RecommenderError::MissingPredictions)?;

        let score = evaluation::evaluate(predictions, &self.testing, metric)?;
        info!(
            metric = ?metric,
            score,
            algorithm = ?self.predicted_with,
            "Evaluation complete"
        );
        Ok(score)
    }

    /// Predict with the configured algorithm and score it.
    pub fn run(&mut self, metric: ErrorMetric) -> Result<f64> {
        self.predict(self.config.algorithm)?;
        self.evaluate(metric)
    }

    /// Ranked lists for one user from the current predictions.
    pub fn recommend(&self, user: usize, top_n: usize) -> Result<Ranking> {
        let predictions = self
            .predictions
            .as_ref()
            .ok_or(RecommenderError::MissingPredictions)?;

        let ranking = ranking::rank(
            predictions,
            self.training.ratings(),
            user,
            top_n,
            &self.labels,
        )?;
        debug!(
            user,
            rated = ranking.rated.len(),
            recommended = ranking.recommended.len(),
            "Ranking built"
        );
        Ok(ranking)
    }

    /// Ranked lists for every user, `config.top_n` recommendations each.
    pub fn recommend_all(&self) -> Result<Vec<Ranking>> {
        (0..self.training.ratings().num_users())
            .map(|user| self.recommend(user, self.config.top_n))
            .collect()
    }
}
