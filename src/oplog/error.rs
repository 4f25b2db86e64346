use std::io;

use thiserror::Error;

/// Errors that can occur while reading or writing operation logs
#[derive(Debug, Error)]
pub enum OpLogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {command} payload on line {line}: {source}")]
    Payload {
        line: u64,
        command: String,
        source: serde_json::Error,
    },
}

pub type OpLogResult<T> = Result<T, OpLogError>;
