//! Nutrition estimation through an external vision/text model.
//!
//! The model's reply is untyped text. [`normalize`] is the only place it is
//! turned into typed data; nothing downstream ever sees raw provider output.
//! Analysis never touches the meal store: a result becomes a meal only when
//! the client confirms it through the log endpoint.

mod gemini;
mod normalize;
mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::thumbnail;

pub use gemini::GeminiClient;
pub use normalize::{AnalysisResult, Suggestion};

/// Upper bound on free-text meal descriptions.
const MAX_DESCRIPTION_CHARS: usize = 500;

/// How many of today's food names are shown to the model for variety.
const RECENT_MEALS_IN_PROMPT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("AI provider is not configured")]
    NotConfigured,
    #[error("AI provider call failed: {0}")]
    Provider(String),
    #[error("could not parse AI response: {0}")]
    Parse(String),
}

impl AnalysisError {
    /// Client-facing text. Provider details are logged, not returned.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::NotConfigured => {
                "Gemini API key not configured. Set GEMINI_API_KEY in the environment.".into()
            }
            Self::Provider(_) => "Analysis failed: the AI service could not be reached.".into(),
            Self::Parse(_) => "Could not parse AI response. Please try again.".into(),
        }
    }
}

/// Image payload attached to a model request.
#[derive(Debug, Clone, Copy)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// Raw text generation; one call per request, no shared mutable state.
#[async_trait]
pub trait NutritionModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<InlineImage<'_>>,
    ) -> Result<String, AnalysisError>;
}

pub struct Analyzer {
    model: Arc<dyn NutritionModel>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn NutritionModel>) -> Self {
        Self { model }
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn analyze_image(
        &self,
        image: Bytes,
        mime_type: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::InvalidInput("Empty image file".into()));
        }
        if !is_supported_image(mime_type) {
            return Err(AnalysisError::InvalidInput(format!(
                "Unsupported image type: {mime_type}"
            )));
        }

        let raw = self
            .model
            .generate(
                &prompts::image_analysis(),
                Some(InlineImage {
                    mime_type,
                    data: &image,
                }),
            )
            .await?;
        let mut result = normalize::parse_analysis(&raw)?;
        result.thumbnail = encode_thumbnail(image).await;
        debug!(food_name = %result.food_name, "image analyzed");
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn analyze_text(&self, description: &str) -> Result<AnalysisResult, AnalysisError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AnalysisError::InvalidInput("Description is required".into()));
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AnalysisError::InvalidInput(format!(
                "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        let raw = self
            .model
            .generate(&prompts::text_analysis(description), None)
            .await?;
        normalize::parse_analysis(&raw)
    }

    #[instrument(skip(self, recent_food_names))]
    pub async fn suggest_meals(
        &self,
        remaining_calories: i64,
        recent_food_names: &[String],
    ) -> Result<Vec<Suggestion>, AnalysisError> {
        let skip = recent_food_names
            .len()
            .saturating_sub(RECENT_MEALS_IN_PROMPT);
        let prompt = prompts::meal_suggestions(
            remaining_calories.max(0),
            &recent_food_names[skip..],
        );
        let raw = self.model.generate(&prompt, None).await?;
        normalize::parse_suggestions(&raw)
    }
}

/// Builds the stored thumbnail off the async runtime. Failure only costs the
/// preview, so it is logged and swallowed.
async fn encode_thumbnail(image: Bytes) -> Option<String> {
    match tokio::task::spawn_blocking(move || thumbnail::make_thumbnail(&image)).await {
        Ok(Ok(thumb)) => Some(STANDARD.encode(thumb)),
        Ok(Err(e)) => {
            warn!(error = %e, "thumbnail generation failed; continuing without");
            None
        }
        Err(e) => {
            warn!(error = %e, "thumbnail task aborted; continuing without");
            None
        }
    }
}

fn is_supported_image(ct: &str) -> bool {
    matches!(
        ct,
        "image/jpeg" | "image/jpg" | "image/png" | "image/webp" | "image/gif" | "image/heic"
            | "image/heif"
    )
}
