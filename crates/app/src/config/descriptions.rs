//! Descriptions Config

use clap::Args;

use crate::descriptions::{
    GeminiConfig,
    gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL},
};

/// Description generation settings.
#[derive(Debug, Clone, Args)]
pub struct DescriptionsConfig {
    /// Gemini API key; without it generation returns a fixed message
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub gemini_endpoint: String,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub gemini_model: String,
}

impl From<&DescriptionsConfig> for GeminiConfig {
    fn from(config: &DescriptionsConfig) -> Self {
        Self {
            endpoint: config.gemini_endpoint.clone(),
            api_key: config
                .gemini_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: config.gemini_model.clone(),
        }
    }
}
