use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AnalysisError, EncodedImage};
use crate::models::MealAnalysis;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Documented placeholder shipped in `.env.example`; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Total attempts for a 503, including the first one.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

const ANALYSIS_PROMPT: &str = "You are a nutrition analyst. Look carefully at the attached photo of a meal \
and respond with a single JSON object, no prose, using exactly this schema:\n\
{\n\
  \"name\": string (short dish name),\n\
  \"calories\": integer (kcal for the visible portion),\n\
  \"protein\": integer (grams),\n\
  \"carbs\": integer (grams),\n\
  \"fat\": integer (grams),\n\
  \"cholesterol\": one of \"Low\", \"Medium\", \"High\",\n\
  \"isAlcoholic\": boolean,\n\
  \"warnings\": array of short strings such as \"high sodium\" or \"contains nuts\", [] if none\n\
}\n\
Estimate portion size from the photo.";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: String,
}

// Response envelope: every branch is optional, accessed positionally
// (first candidate, first part). A missing branch is MalformedEnvelope.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Option<Vec<ModelInfo>>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
    #[serde(rename = "supportedGenerationMethods", default)]
    supported_generation_methods: Vec<String>,
}

/// Client for the Gemini generateContent endpoint.
///
/// The API key is injected at construction and validated per request; it is
/// sent as a percent-encoded query parameter and never logged.
pub struct GeminiService {
    api_key: String,
    model: String,
    base_url: String,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_delay: RETRY_DELAY,
            client: reqwest::Client::new(),
        }
    }

    /// Point the service at a different endpoint (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the fixed 503 retry delay (used by tests).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Run one analysis: build the request once, send it, retry on 503 with
    /// a fixed delay (3 attempts total), validate the response into a
    /// `MealAnalysis`.
    pub async fn analyze_meal(&self, image: &EncodedImage) -> Result<MealAnalysis, AnalysisError> {
        let url = self.generate_url()?;
        let request = self.build_request(image);

        let mut attempt = 1u32;
        loop {
            log::info!(
                "🤖 Sending meal photo to Gemini model {} (attempt {}/{})",
                self.model,
                attempt,
                MAX_ATTEMPTS
            );

            let response = self
                .client
                .post(url.clone())
                .json(&request)
                .send()
                .await
                .map_err(|e| AnalysisError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            log::debug!("📥 Gemini response status: {}", status);

            match status {
                200 => {
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| AnalysisError::Transport(e.to_string()))?;
                    return Self::parse_analysis(&body);
                }
                503 if attempt < MAX_ATTEMPTS => {
                    log::warn!(
                        "⏳ Gemini is overloaded (503), retrying in {:?}",
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                404 => {
                    let body = self.describe_missing_model().await;
                    log::error!("❌ {}", body);
                    return Err(AnalysisError::Provider { status: 404, body });
                }
                _ => {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown Error".to_string());
                    log::error!("❌ Gemini API error ({}): {}", status, body);
                    return Err(AnalysisError::Provider { status, body });
                }
            }
        }
    }

    /// Validate the key, percent-encode it for the query string.
    fn encoded_key(&self) -> Result<String, AnalysisError> {
        if self.api_key.is_empty() || self.api_key == PLACEHOLDER_API_KEY {
            return Err(AnalysisError::MissingCredential);
        }
        if self.api_key.chars().any(|c| c.is_control()) {
            return Err(AnalysisError::CredentialEncoding);
        }
        Ok(urlencoding::encode(&self.api_key).into_owned())
    }

    fn generate_url(&self) -> Result<reqwest::Url, AnalysisError> {
        let key = self.encoded_key()?;
        let raw = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        );
        reqwest::Url::parse(&raw).map_err(|e| AnalysisError::InvalidEndpoint(e.to_string()))
    }

    fn build_request(&self, image: &EncodedImage) -> GenerateRequest {
        GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        }
    }

    /// Decode the envelope, pull out the first candidate's first part, then
    /// decode that text against the nutrition schema.
    fn parse_analysis(body: &[u8]) -> Result<MealAnalysis, AnalysisError> {
        let envelope: GenerateResponse =
            serde_json::from_slice(body).map_err(|_| AnalysisError::MalformedEnvelope)?;

        let text = envelope
            .candidates
            .and_then(|mut candidates| {
                if candidates.is_empty() {
                    None
                } else {
                    Some(candidates.remove(0))
                }
            })
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|mut parts| {
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.remove(0))
                }
            })
            .and_then(|part| part.text)
            .ok_or(AnalysisError::MalformedEnvelope)?;

        serde_json::from_str(&text).map_err(|e| AnalysisError::MalformedPayload(e.to_string()))
    }

    /// Diagnostic for a 404: name up to three models that do support
    /// generateContent. A failing diagnostic never masks the original 404.
    async fn describe_missing_model(&self) -> String {
        match self.list_generate_models().await {
            Ok(names) if !names.is_empty() => format!(
                "Model '{}' not found. Available models: {}",
                self.model,
                names.join(", ")
            ),
            _ => format!("Model '{}' not found; no accessible models", self.model),
        }
    }

    async fn list_generate_models(&self) -> Result<Vec<String>, AnalysisError> {
        let key = self.encoded_key()?;
        let raw = format!("{}/models?key={}", self.base_url, key);
        let url =
            reqwest::Url::parse(&raw).map_err(|e| AnalysisError::InvalidEndpoint(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown Error".to_string());
            return Err(AnalysisError::Provider { status, body });
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|_| AnalysisError::MalformedEnvelope)?;

        let names = listing
            .models
            .unwrap_or_default()
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .take(3)
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .unwrap_or(&m.name)
                    .to_string()
            })
            .collect();

        Ok(names)
    }
}
