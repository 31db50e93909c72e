//! Hosted identity provider client.
//!
//! Talks to an identity-toolkit style REST API: password sign-in and sign-up
//! are `POST {endpoint}/v1/accounts:{action}?key={api_key}`, and failures come
//! back as `{"error": {"message": "CODE : detail"}}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::{AuthError, AuthService, Credential, Role, UserIdentity};

/// Public identity toolkit endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";

/// Configuration for [`IdentityProviderAuth`].
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    /// Base URL, without a trailing slash.
    pub endpoint: String,

    pub api_key: String,

    /// Accounts with these emails sign in as admins.
    pub admin_emails: Vec<String>,
}

/// Password authentication against a hosted identity provider.
#[derive(Debug)]
pub struct IdentityProviderAuth {
    config: IdentityProviderConfig,
    http: Client,
    current: watch::Sender<Option<UserIdentity>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityProviderAuth {
    #[must_use]
    pub fn new(config: IdentityProviderConfig) -> Self {
        Self {
            config,
            http: Client::new(),
            current: watch::Sender::new(None),
        }
    }

    fn role_for(&self, email: Option<&str>) -> Role {
        let is_admin = email.is_some_and(|email| {
            self.config
                .admin_emails
                .iter()
                .any(|admin| admin.eq_ignore_ascii_case(email))
        });

        if is_admin { Role::Admin } else { Role::Customer }
    }

    async fn password_request(
        &self,
        action: &str,
        credential: &Credential,
    ) -> Result<UserIdentity, AuthError> {
        let url = format!(
            "{}/v1/accounts:{action}?key={}",
            self.config.endpoint, self.config.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&PasswordRequest {
                email: credential.identifier(),
                password: credential.secret(),
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            let error = serde_json::from_str::<ErrorResponse>(&text).map_or_else(
                |_| AuthError::Provider(format!("request failed with status {status}: {text}")),
                |body| map_error_code(&body.error.message),
            );

            warn!(%status, action, %error, "identity provider rejected request");

            return Err(error);
        }

        let account: AccountResponse = response.json().await?;
        let role = self.role_for(account.email.as_deref());

        let identity = UserIdentity {
            uid: account.local_id,
            email: account.email,
            role,
        };

        info!(uid = %identity.uid, role = ?identity.role, action, "identity provider accepted credentials");

        self.current.send_replace(Some(identity.clone()));

        Ok(identity)
    }
}

/// Maps a provider error message such as `WEAK_PASSWORD : Password should be
/// at least 6 characters` to an [`AuthError`].
pub(crate) fn map_error_code(message: &str) -> AuthError {
    let code = message.split_once(" : ").map_or(message, |(code, _)| code).trim();

    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
        | "USER_DISABLED" => AuthError::InvalidCredential,
        "WEAK_PASSWORD" => AuthError::WeakSecret,
        "EMAIL_EXISTS" => AuthError::AccountExists,
        "OPERATION_NOT_ALLOWED" => AuthError::SignUpUnsupported,
        _ => AuthError::Provider(message.to_string()),
    }
}

#[async_trait]
impl AuthService for IdentityProviderAuth {
    async fn sign_in(&self, credential: Credential) -> Result<UserIdentity, AuthError> {
        self.password_request("signInWithPassword", &credential)
            .await
    }

    async fn sign_up(&self, credential: Credential) -> Result<UserIdentity, AuthError> {
        self.password_request("signUp", &credential).await
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
