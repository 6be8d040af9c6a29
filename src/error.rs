use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaitForgeError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Population too small for donor selection, empty sequence, etc.
    #[error("Precondition Violation: {0}")]
    Precondition(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type GfResult<T> = Result<T, GaitForgeError>;
