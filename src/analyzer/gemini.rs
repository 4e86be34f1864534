use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{AnalysisError, InlineImage, NutritionModel};
use crate::config::GeminiConfig;

/// Longest slice of a non-JSON error body kept in the log message.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_config(cfg: &GeminiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build gemini http client")?;
        Ok(Self {
            client,
            api_key: cfg.usable_api_key().map(str::to_owned),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn api_error(status: u16, body: &str) -> AnalysisError {
        let message = serde_json::from_str::<GenerateResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(
                || body.chars().take(MAX_ERROR_BODY).collect(),
                |e| e.message,
            );
        AnalysisError::Provider(format!("Gemini API error ({status}): {message}"))
    }

    fn extract_text(response: GenerateResponse) -> Result<String, AnalysisError> {
        if let Some(err) = response.error {
            return Err(AnalysisError::Provider(format!(
                "Gemini API error: {}",
                err.message
            )));
        }
        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AnalysisError::Provider("no content in Gemini response".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl NutritionModel for GeminiClient {
    #[instrument(skip(self, prompt, image), fields(model = %self.model, with_image = image.is_some()))]
    async fn generate(
        &self,
        prompt: &str,
        image: Option<InlineImage<'_>>,
    ) -> Result<String, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::NotConfigured)?;

        let mut parts = Vec::with_capacity(2);
        if let Some(img) = image {
            parts.push(RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: img.mime_type,
                    data: STANDARD.encode(img.data),
                },
            });
        }
        parts.push(RequestPart::Text { text: prompt });
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts }],
        };

        debug!("sending request to Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Provider(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Provider(format!("read response: {}", e.without_url())))?;

        if !status.is_success() {
            error!(%status, "Gemini API error");
            return Err(Self::api_error(status.as_u16(), &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Provider(format!("unexpected response envelope: {e}")))?;
        Self::extract_text(parsed)
    }
}
