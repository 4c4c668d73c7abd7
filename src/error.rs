use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Empty dataset: the input contains no data rows")]
    EmptyDataset,

    #[error("Unknown machine: {0}")]
    UnknownMachine(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
