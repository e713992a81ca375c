pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    #[error("{axis} index {index} out of range (bound {bound})")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("Invalid rank {rank}: must be below {limit}")]
    InvalidRank { rank: usize, limit: usize },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Test matrix has no observed ratings")]
    EmptyTestSet,

    #[error("Similarity undefined for zero-magnitude vector")]
    UndefinedSimilarity,

    #[error("Normal equations are not positive definite")]
    SingularSystem,

    #[error("Decomposition failed: {0}")]
    Decomposition(String),

    #[error("No predictions computed yet")]
    MissingPredictions,

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        key: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecommenderError {
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }

    pub fn configuration(message: impl Into<String>, key: &str) -> Self {
        Self::Configuration {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
