use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Decode error at row {row}, column {column}: {message}")]
    Decode {
        row: u64,
        column: String,
        message: String,
    },

    #[error("Insert error: {0}")]
    Insert(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrendError>;
