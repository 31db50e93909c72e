//! Auth Config

use clap::Args;

use crate::auth::provider::DEFAULT_ENDPOINT;

/// Identity source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AuthBackend {
    /// One configured admin account.
    Static,

    /// Hosted identity provider.
    Provider,
}

/// Identity settings.
#[derive(Debug, Clone, Args)]
pub struct AuthConfig {
    /// Identity backend (static, provider)
    #[arg(long = "auth", env = "GAMEPART_AUTH", value_enum, default_value_t = AuthBackend::Static)]
    pub backend: AuthBackend,

    /// Admin username for the static backend
    #[arg(long, env = "GAMEPART_ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Hex SHA-256 of the admin password for the static backend
    #[arg(long, env = "GAMEPART_ADMIN_PASSWORD_SHA256", hide_env_values = true)]
    pub admin_password_sha256: Option<String>,

    /// Identity provider base URL
    #[arg(long, env = "IDENTITY_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub identity_endpoint: String,

    /// Identity provider API key
    #[arg(long, env = "IDENTITY_API_KEY", hide_env_values = true)]
    pub identity_api_key: Option<String>,

    /// Comma-separated emails that sign in as admins through the provider
    #[arg(long, env = "GAMEPART_ADMIN_EMAILS", value_delimiter = ',')]
    pub admin_emails: Vec<String>,
}
