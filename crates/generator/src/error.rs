use thiserror::Error;

use pim_core::DomainError;
use pim_shelf::ShelfError;

/// Failure of a session commit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("shelf rejected the batch: {0}")]
    Shelf(#[from] ShelfError),
}
