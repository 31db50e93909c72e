//! Authentication
//!
//! Identity comes either from one configured admin credential or from a
//! hosted identity provider. Either way the rest of the app only sees a
//! [`UserIdentity`] with a [`Role`].

mod errors;
mod models;
pub mod provider;
mod service;

pub use errors::*;
pub use models::*;
pub use provider::{IdentityProviderAuth, IdentityProviderConfig};
pub use service::*;
