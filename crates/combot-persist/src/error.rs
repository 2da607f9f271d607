use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Identifier that the backend cannot even parse
    #[error("Invalid conversation ID: {0}")]
    InvalidId(String),

    #[error("Could not reach the conversation store: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
