//! Storefront errors.

use gamepart::checkout::CheckoutError;
use thiserror::Error;

use crate::{
    auth::AuthError,
    domain::{catalog::CatalogServiceError, orders::OrdersServiceError},
};

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("admin identity required")]
    Forbidden,

    #[error("part name and category are required")]
    MissingDescriptionInput,

    #[error(transparent)]
    Catalog(#[from] CatalogServiceError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
