//! Gemini REST wire types and response extraction.

use joblink_core::AssistantError;
use joblink_core::assistant::{EditedImage, ImageReference};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

// ============================================================================
// generateContent / streamGenerateContent
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    fn parts(self) -> Vec<PartResponse> {
        self.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default()
    }
}

/// Parses one SSE event of a streamed reply into its text fragment.
///
/// Events without text (e.g. the final usage-metadata event) yield `None`.
pub(crate) fn parse_stream_event(payload: &str) -> Result<Option<String>, AssistantError> {
    if let Ok(wrapper) = serde_json::from_str::<ErrorWrapper>(payload) {
        return Err(AssistantError::backend(wrapper.error.describe(payload)));
    }

    let response: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| AssistantError::backend(format!("Failed to parse Gemini stream event: {e}")))?;

    let text: String = response
        .parts()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    Ok((!text.is_empty()).then_some(text))
}

/// Pulls the edited image and any accompanying text out of a response.
pub(crate) fn extract_edited_image(
    response: GenerateContentResponse,
) -> Result<EditedImage, AssistantError> {
    let mut image = None;
    let mut texts = Vec::new();

    for part in response.parts() {
        if let Some(text) = part.text {
            texts.push(text);
        }
        if image.is_none() {
            if let Some(inline) = part.inline_data {
                image = Some(ImageReference::from_base64(&inline.mime_type, &inline.data));
            }
        }
    }

    let explanation = texts.join("").trim().to_string();
    let explanation = (!explanation.is_empty()).then_some(explanation);

    match image {
        Some(image) => Ok(EditedImage { image, explanation }),
        None => Err(AssistantError::backend(match explanation {
            Some(text) => format!("The model did not return an edited image. {text}"),
            None => "The model did not return an edited image.".to_string(),
        })),
    }
}

// ============================================================================
// Imagen :predict
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictParameters {
    pub sample_count: u32,
    pub output_mime_type: String,
    pub aspect_ratio: String,
}

impl PredictRequest {
    pub fn single_jpeg(prompt: &str) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
                aspect_ratio: "1:1".to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// First generated image, or an error when the service returned none.
pub(crate) fn extract_generated_image(
    response: PredictResponse,
) -> Result<ImageReference, AssistantError> {
    response
        .predictions
        .into_iter()
        .find_map(|prediction| {
            let data = prediction.bytes_base64_encoded?;
            let mime_type = prediction
                .mime_type
                .unwrap_or_else(|| "image/jpeg".to_string());
            Some(ImageReference::from_base64(&mime_type, &data))
        })
        .ok_or_else(|| AssistantError::backend("No image was generated."))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(self, raw: &str) -> String {
        let status_text = self.status.unwrap_or_default();
        let msg = self.message.unwrap_or_else(|| raw.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

pub(crate) fn map_http_error(status: StatusCode, body: String) -> AssistantError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("Gemini API returned HTTP {}", status.as_u16())
            } else {
                body.clone()
            }
        });

    AssistantError::backend(message)
}
