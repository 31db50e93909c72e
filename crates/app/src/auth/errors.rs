//! Auth errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredential,

    #[error("password is too weak")]
    WeakSecret,

    #[error("an account with this email already exists")]
    AccountExists,

    #[error("sign-up is not available")]
    SignUpUnsupported,

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("identity provider unreachable")]
    Http(#[from] reqwest::Error),
}
