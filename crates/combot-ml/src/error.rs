use thiserror::Error;

#[derive(Error, Debug)]
pub enum MlError {
    #[error("Classifier busy: all {max_concurrent} slots in use")]
    Busy { max_concurrent: usize },

    #[error("Failed to load model {model}: {reason}")]
    ModelLoad { model: String, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MlError {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for MlError {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MlError>;
