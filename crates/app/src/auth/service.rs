//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::info;

use crate::auth::{AuthError, Credential, Role, UserIdentity};

/// Hex SHA-256 digest of a password, as stored in configuration.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

/// A single configured admin account.
#[derive(Debug)]
pub struct StaticAdminAuth {
    username: String,
    password_sha256: String,
    current: watch::Sender<Option<UserIdentity>>,
}

impl StaticAdminAuth {
    /// `password_sha256` is the lowercase hex digest of the admin password.
    #[must_use]
    pub fn new(username: impl Into<String>, password_sha256: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_sha256: password_sha256.into().to_ascii_lowercase(),
            current: watch::Sender::new(None),
        }
    }
}

#[async_trait]
impl AuthService for StaticAdminAuth {
    async fn sign_in(&self, credential: Credential) -> Result<UserIdentity, AuthError> {
        if credential.identifier() != self.username
            || hash_secret(credential.secret()) != self.password_sha256
        {
            return Err(AuthError::InvalidCredential);
        }

        let identity = UserIdentity {
            uid: self.username.clone(),
            email: None,
            role: Role::Admin,
        };

        info!(uid = %identity.uid, "admin signed in");

        self.current.send_replace(Some(identity.clone()));

        Ok(identity)
    }

    async fn sign_up(&self, _credential: Credential) -> Result<UserIdentity, AuthError> {
        Err(AuthError::SignUpUnsupported)
    }

    async fn sign_out(&self) {
        self.current.send_replace(None);
    }

    async fn current_user(&self) -> Option<UserIdentity> {
        self.current.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.current.subscribe()
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Signs in and becomes the current user.
    async fn sign_in(&self, credential: Credential) -> Result<UserIdentity, AuthError>;

    /// Registers an account and signs it in.
    async fn sign_up(&self, credential: Credential) -> Result<UserIdentity, AuthError>;

    async fn sign_out(&self);

    async fn current_user(&self) -> Option<UserIdentity>;

    /// Notified whenever the current user changes.
    fn watch(&self) -> watch::Receiver<Option<UserIdentity>>;
}
