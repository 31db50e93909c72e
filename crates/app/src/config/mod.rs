//! Application configuration
//!
//! Every setting can come from a flag or an environment variable; a `.env`
//! file in the working directory is loaded first.

use clap::Args;

pub mod auth;
pub mod descriptions;
pub mod logging;
pub mod store;

pub use auth::{AuthBackend, AuthConfig};
pub use descriptions::DescriptionsConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use store::{StoreBackend, StoreConfig};

/// All configuration sections.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Persistence settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Identity settings.
    #[command(flatten)]
    pub auth: AuthConfig,

    /// Description generation settings.
    #[command(flatten)]
    pub descriptions: DescriptionsConfig,
}
