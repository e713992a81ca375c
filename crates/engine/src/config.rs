//! Engine configuration
//!
//! Hyperparameters and algorithm selection, loaded from environment
//! variables with the `TAPROOM_` prefix. A `.env` file is honoured when
//! [`load_dotenv`] is called first.
//!
//! # Example
//!
//! ```no_run
//! use taproom_engine::config::{load_dotenv, ConfigLoader, RecommenderConfig};
//!
//! load_dotenv();
//! let config = RecommenderConfig::from_env()?;
//! config.validate()?;
//! # Ok::<(), taproom_engine::RecommenderError>(())
//! ```

use crate::error::RecommenderError;
use crate::factorization::{AlsConfig, SgdConfig, SvdConfig};
use crate::types::{Algorithm, Centering, SimilarityAxis};

/// Configuration loader trait
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables, with defaults for
    /// anything unset.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if a value cannot be parsed.
    fn from_env() -> Result<Self, RecommenderError>;

    /// Check value ranges.
    fn validate(&self) -> Result<(), RecommenderError>;
}

/// Engine configuration
///
/// # Environment Variables
///
/// - `TAPROOM_LATENT_FACTORS`: latent rank `k` (default: 10)
/// - `TAPROOM_LEARNING_RATE`: SGD step size (default: 0.0002)
/// - `TAPROOM_REGULARIZATION`: SGD/ALS penalty (default: 0.02)
/// - `TAPROOM_ITERATIONS`: SGD sweeps / ALS rounds (default: 10)
/// - `TAPROOM_SIMILARITY_AXIS`: `user` or `item` (default: user)
/// - `TAPROOM_ALGORITHM`: `user-user`, `item-item`, `neighborhood`, `svd`,
///   `sgd` or `als` (default: neighborhood along the similarity axis)
/// - `TAPROOM_MEAN_CENTERING`: center rows before similarity (default: false)
/// - `TAPROOM_SEED`: RNG seed for reproducible runs (default: unset)
/// - `TAPROOM_TOP_N`: recommendations per user (default: 10)
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    pub latent_factors: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    pub iterations: usize,
    pub similarity_axis: SimilarityAxis,
    pub algorithm: Algorithm,
    pub mean_centering: bool,
    pub seed: Option<u64>,
    pub top_n: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            latent_factors: 10,
            learning_rate: 0.0002,
            regularization: 0.02,
            iterations: 10,
            similarity_axis: SimilarityAxis::User,
            algorithm: Algorithm::NeighborhoodUser,
            mean_centering: false,
            seed: None,
            top_n: 10,
        }
    }
}

impl RecommenderConfig {
    pub fn centering(&self) -> Centering {
        Centering::from_flag(self.mean_centering)
    }

    pub fn svd(&self) -> SvdConfig {
        SvdConfig {
            latent_factors: self.latent_factors,
        }
    }

    pub fn sgd(&self) -> SgdConfig {
        SgdConfig {
            latent_factors: self.latent_factors,
            learning_rate: self.learning_rate,
            regularization: self.regularization,
            iterations: self.iterations,
            seed: self.seed,
        }
    }

    pub fn als(&self) -> AlsConfig {
        AlsConfig {
            latent_factors: self.latent_factors,
            regularization: self.regularization,
            iterations: self.iterations,
            seed: self.seed,
        }
    }
}

impl ConfigLoader for RecommenderConfig {
    fn from_env() -> Result<Self, RecommenderError> {
        let defaults = RecommenderConfig::default();

        let similarity_axis =
            parse_env_var("TAPROOM_SIMILARITY_AXIS", defaults.similarity_axis)?;

        let algorithm = match std::env::var("TAPROOM_ALGORITHM") {
            Ok(value) if value.trim().eq_ignore_ascii_case("neighborhood") => {
                Algorithm::neighborhood(similarity_axis)
            }
            Ok(value) => value.parse::<Algorithm>()?,
            Err(_) => Algorithm::neighborhood(similarity_axis),
        };

        let seed = match std::env::var("TAPROOM_SEED") {
            Ok(value) => Some(value.parse::<u64>().map_err(|e| {
                RecommenderError::configuration(
                    format!("Failed to parse TAPROOM_SEED: {}", e),
                    "TAPROOM_SEED",
                )
            })?),
            Err(_) => None,
        };

        Ok(Self {
            latent_factors: parse_env_var("TAPROOM_LATENT_FACTORS", defaults.latent_factors)?,
            learning_rate: parse_env_var("TAPROOM_LEARNING_RATE", defaults.learning_rate)?,
            regularization: parse_env_var("TAPROOM_REGULARIZATION", defaults.regularization)?,
            iterations: parse_env_var("TAPROOM_ITERATIONS", defaults.iterations)?,
            similarity_axis,
            algorithm,
            mean_centering: parse_env_var("TAPROOM_MEAN_CENTERING", defaults.mean_centering)?,
            seed,
            top_n: parse_env_var("TAPROOM_TOP_N", defaults.top_n)?,
        })
    }

    fn validate(&self) -> Result<(), RecommenderError> {
        if self.latent_factors == 0 {
            return Err(RecommenderError::configuration(
                "latent_factors must be greater than 0",
                "TAPROOM_LATENT_FACTORS",
            ));
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(RecommenderError::configuration(
                format!("learning_rate must be positive, got {}", self.learning_rate),
                "TAPROOM_LEARNING_RATE",
            ));
        }

        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(RecommenderError::configuration(
                format!(
                    "regularization must be non-negative, got {}",
                    self.regularization
                ),
                "TAPROOM_REGULARIZATION",
            ));
        }

        if self.iterations == 0 {
            return Err(RecommenderError::configuration(
                "iterations must be greater than 0",
                "TAPROOM_ITERATIONS",
            ));
        }

        if let Some(axis) = self.algorithm.similarity_axis() {
            if axis != self.similarity_axis {
                return Err(RecommenderError::configuration(
                    format!(
                        "algorithm {} conflicts with similarity axis {}",
                        self.algorithm, self.similarity_axis
                    ),
                    "TAPROOM_ALGORITHM",
                ));
            }
        }

        if self.top_n == 0 {
            return Err(RecommenderError::configuration(
                "top_n must be greater than 0",
                "TAPROOM_TOP_N",
            ));
        }

        Ok(())
    }
}

/// Parse environment variable with type conversion
fn parse_env_var<T>(key: &str, default: T) -> Result<T, RecommenderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| RecommenderError::Configuration {
                message: format!("Failed to parse {}: {}", key, e),
                key: Some(key.to_string()),
            })
        })
        .unwrap_or(Ok(default))
}

/// Load .env file if present
///
/// Does not fail when no .env file exists.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Environment variables are process-wide; keep every env-mutating
    // assertion in this one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("TAPROOM_LATENT_FACTORS", "25");
        env::set_var("TAPROOM_LEARNING_RATE", "0.001");
        env::set_var("TAPROOM_ALGORITHM", "neighborhood");
        env::set_var("TAPROOM_SIMILARITY_AXIS", "item");
        env::set_var("TAPROOM_MEAN_CENTERING", "true");
        env::set_var("TAPROOM_SEED", "99");

        let config = RecommenderConfig::from_env().unwrap();
        assert_eq!(config.latent_factors, 25);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.algorithm, Algorithm::NeighborhoodItem);
        assert_eq!(config.similarity_axis, SimilarityAxis::Item);
        assert!(config.mean_centering);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.regularization, 0.02);
        assert!(config.validate().is_ok());

        env::set_var("TAPROOM_ALGORITHM", "als");
        assert_eq!(
            RecommenderConfig::from_env().unwrap().algorithm,
            Algorithm::FactorAls
        );

        env::set_var("TAPROOM_ALGORITHM", "user-user");
        let conflicting = RecommenderConfig::from_env().unwrap();
        assert_eq!(conflicting.algorithm, Algorithm::NeighborhoodUser);
        assert!(matches!(
            conflicting.validate(),
            Err(RecommenderError::Configuration { key: Some(ref k), .. }) if k == "TAPROOM_ALGORITHM"
        ));

        env::set_var("TAPROOM_ITERATIONS", "many");
        let err = RecommenderConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            RecommenderError::Configuration { key: Some(ref k), .. } if k == "TAPROOM_ITERATIONS"
        ));

        for key in [
            "TAPROOM_LATENT_FACTORS",
            "TAPROOM_LEARNING_RATE",
            "TAPROOM_ALGORITHM",
            "TAPROOM_SIMILARITY_AXIS",
            "TAPROOM_MEAN_CENTERING",
            "TAPROOM_SEED",
            "TAPROOM_ITERATIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = RecommenderConfig::default();
        assert_eq!(config.latent_factors, 10);
        assert_eq!(config.learning_rate, 0.0002);
        assert_eq!(config.regularization, 0.02);
        assert_eq!(config.centering(), Centering::Raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strategy_configs_share_hyperparameters() {
        let config = RecommenderConfig {
            latent_factors: 4,
            seed: Some(3),
            ..Default::default()
        };
        assert_eq!(config.sgd().latent_factors, 4);
        assert_eq!(config.als().seed, Some(3));
        assert_eq!(config.svd().latent_factors, 4);
    }

    #[test]
    fn test_validation_errors() {
        let invalid = [
            RecommenderConfig {
                latent_factors: 0,
                ..Default::default()
            },
            RecommenderConfig {
                learning_rate: 0.0,
                ..Default::default()
            },
            RecommenderConfig {
                regularization: -0.1,
                ..Default::default()
            },
            RecommenderConfig {
                regularization: f64::NAN,
                ..Default::default()
            },
            RecommenderConfig {
                iterations: 0,
                ..Default::default()
            },
            RecommenderConfig {
                top_n: 0,
                ..Default::default()
            },
            RecommenderConfig {
                algorithm: Algorithm::NeighborhoodItem,
                similarity_axis: SimilarityAxis::User,
                ..Default::default()
            },
        ];
        for config in invalid {
            assert!(matches!(
                config.validate(),
                Err(RecommenderError::Configuration { .. })
            ));
        }
    }
}
