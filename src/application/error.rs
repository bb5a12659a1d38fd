use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError, loader::LoaderError};

/// Top-level failure of a `pager` command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{failed} of {requested} fetches failed")]
    FetchesFailed { failed: usize, requested: usize },
}
