use routeset_core::model::{demand::DemandError, network::NetworkError};

#[derive(thiserror::Error, Debug)]
pub enum RouteChoiceError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("node {0} is not present in the compact graph")]
    InvalidNode(u32),
    #[error("results have not been computed; run batched() first")]
    ResultsNotComputed,
    #[error(transparent)]
    Demand(#[from] DemandError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("checkpoint dataset error: {0}")]
    Checkpoint(String),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("checkpoint i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build worker thread pool: {0}")]
    ThreadPool(String),
}
