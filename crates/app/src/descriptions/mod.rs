//! Part description generation
//!
//! Descriptions come from an external generative-text API. Callers that only
//! need text to show use [`describe_or_fallback`], which turns every failure
//! into a fixed message; nothing is retried or saved automatically.

mod errors;
pub mod gemini;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use errors::GenerationError;
pub use gemini::{GeminiClient, GeminiConfig};

/// Shown when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str = "Error: API Key missing. Unable to generate description.";

/// Shown when the API call fails.
pub const FAILED_MESSAGE: &str = "Failed to generate description. Please try again.";

/// Shown when the API answers without text.
pub const EMPTY_MESSAGE: &str = "No description generated.";

/// What to describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionRequest {
    pub part_name: String,

    /// Console system, i.e. the part's category
    pub category: String,

    pub subcategory: Option<String>,
}

impl DescriptionRequest {
    #[must_use]
    pub fn new(
        part_name: impl Into<String>,
        category: impl Into<String>,
        subcategory: Option<String>,
    ) -> Self {
        Self {
            part_name: part_name.into(),
            category: category.into(),
            subcategory: subcategory.filter(|subcategory| !subcategory.trim().is_empty()),
        }
    }

    /// Prompt sent to the model.
    #[must_use]
    pub fn prompt(&self) -> String {
        let subcategory = self
            .subcategory
            .as_deref()
            .map(|subcategory| format!("Subcategory/Type: {subcategory}\n"))
            .unwrap_or_default();

        format!(
            "You are an expert video game console repair technician.\n\
             Write a concise, professional, and sales-oriented product description (max 40 words) for a replacement part.\n\
             \n\
             Part Name: {}\n\
             Console System: {}\n\
             {subcategory}\
             \n\
             Focus on compatibility, quality, and technical specs if relevant.\n\
             Return plain text only.",
            self.part_name, self.category
        )
    }
}

#[automock]
#[async_trait]
pub trait DescriptionService: Send + Sync {
    /// Generates a sales description.
    async fn generate(&self, request: DescriptionRequest) -> Result<String, GenerationError>;
}

/// Generate a description, replacing any failure with its fixed message.
pub async fn describe_or_fallback(
    service: &dyn DescriptionService,
    request: DescriptionRequest,
) -> String {
    match service.generate(request).await {
        Ok(text) => text,
        Err(GenerationError::MissingApiKey) => MISSING_KEY_MESSAGE.to_string(),
        Err(GenerationError::Empty) => EMPTY_MESSAGE.to_string(),
        Err(error) => {
            warn!(%error, "description generation failed");

            FAILED_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(subcategory: Option<&str>) -> DescriptionRequest {
        DescriptionRequest::new("類比搖桿模組", "PS5", subcategory.map(str::to_string))
    }

    #[test]
    fn prompt_names_part_and_console() {
        let prompt = request(Some("Controller")).prompt();

        assert!(prompt.starts_with("You are an expert video game console repair technician."));
        assert!(prompt.contains("(max 40 words)"));
        assert!(prompt.contains("Part Name: 類比搖桿模組\n"));
        assert!(prompt.contains("Console System: PS5\n"));
        assert!(prompt.contains("Subcategory/Type: Controller\n"));
        assert!(prompt.ends_with("Return plain text only."));
    }

    #[test]
    fn blank_subcategories_are_left_out_of_the_prompt() {
        assert!(!request(None).prompt().contains("Subcategory/Type"));
        assert!(!request(Some("  ")).prompt().contains("Subcategory/Type"));
    }

    #[tokio::test]
    async fn failures_fall_back_to_fixed_messages() {
        let cases = [
            (GenerationError::MissingApiKey, MISSING_KEY_MESSAGE),
            (GenerationError::Empty, EMPTY_MESSAGE),
            (
                GenerationError::Status {
                    status: 500,
                    body: "boom".to_string(),
                },
                FAILED_MESSAGE,
            ),
        ];

        for (error, expected) in cases {
            let mut service = MockDescriptionService::new();
            service.expect_generate().return_once(move |_| Err(error));

            assert_eq!(describe_or_fallback(&service, request(None)).await, expected);
        }
    }

    #[tokio::test]
    async fn generated_text_is_returned_as_is() {
        let mut service = MockDescriptionService::new();
        service
            .expect_generate()
            .withf(|request| request.category == "PS5")
            .return_once(|_| Ok("Drop-in replacement.".to_string()));

        assert_eq!(
            describe_or_fallback(&service, request(None)).await,
            "Drop-in replacement."
        );
    }
}
