//! Error types for the draw engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid period format: {0}")]
    InvalidPeriodFormat(String),

    #[error("invalid manual draw: {0}")]
    InvalidManualDraw(String),

    #[error("draw already exists for period {0}")]
    DuplicateDraw(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
