//! Application-wide error types.

use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    /// Malformed or inconsistent content. Aborts catalog construction.
    #[error("content error: {0}")]
    Content(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Content(e.to_string())
    }
}
