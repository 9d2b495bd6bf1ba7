use thiserror::Error;

pub type NavResult<T> = Result<T, NavError>;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model configuration error: {0}")]
    ModelConfiguration(String),

    #[error("Attribution computation error: {0}")]
    Computation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
