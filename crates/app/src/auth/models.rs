//! Auth data models.

use std::fmt;

use gamepart::checkout::Purchaser;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// What a signed-in identity may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browse and buy
    #[default]
    Customer,

    /// Manage the catalog
    Admin,
}

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Provider user id
    pub uid: String,

    /// Account email, when the provider has one
    pub email: Option<String>,

    pub role: Role,
}

impl UserIdentity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Purchaser recorded on orders placed by this identity.
    #[must_use]
    pub fn purchaser(&self) -> Purchaser {
        Purchaser::User {
            uid: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

/// Username (or email) and password. The password is wiped on drop.
#[derive(Clone)]
pub struct Credential {
    identifier: String,
    secret: String,
}

impl Credential {
    #[must_use]
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"**redacted**")
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}
