//! Orders service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("failed to store order")]
    Store(#[from] StoreError),
}

impl OrdersServiceError {
    /// Whether the store refused the write for lack of privileges.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Store(error) => error.is_permission_denied(),
        }
    }
}
