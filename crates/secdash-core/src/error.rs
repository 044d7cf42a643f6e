// crates/secdash-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("base dataset file not found: {path}")]
    BaseNotFound { path: String },

    #[error("failed to parse dataset: {message}")]
    Parse { message: String },

    #[error("filter value for '{column}' must be an integer, got '{value}'")]
    InvalidFilterValue { column: &'static str, value: String },

    #[error("dataset has no '{column}' column")]
    MissingColumn { column: String },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
