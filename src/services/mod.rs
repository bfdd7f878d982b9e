pub mod gemini;
pub mod image;
pub mod journal;

pub use gemini::GeminiService;
pub use image::{EncodedImage, ImageNormalizer};
pub use journal::{FileJournal, MealJournal};

use thiserror::Error;

/// Everything that can go wrong between a raw photo and a validated
/// nutrition record. Only `Provider` with status 503 is ever retried;
/// every other variant is terminal on first occurrence.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to process image: {0}")]
    ImageProcessing(String),

    #[error("Gemini API key is not configured")]
    MissingCredential,

    #[error("Gemini API key contains characters that cannot be sent in a URL")]
    CredentialEncoding,

    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Gemini API error ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Gemini response is missing the expected content")]
    MalformedEnvelope,

    #[error("Gemini response does not match the nutrition schema: {0}")]
    MalformedPayload(String),
}
