//! Catalog service errors.

use gamepart::{catalog::CatalogError, fixtures::FixtureError};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to load default catalog")]
    Fixture(#[from] FixtureError),
}

impl CatalogServiceError {
    /// Whether the store refused the write for lack of privileges.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Store(error) if error.is_permission_denied())
    }
}
