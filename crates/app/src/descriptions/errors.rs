//! Description generation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no text")]
    Empty,
}
