//! Gemini (Google) headshot generator.

use crate::error::{parse_retry_after, sanitize_error_message, HeadshotError, Result};
use crate::generate::prompt::build_prompt;
use crate::generate::provider::{HeadshotGenerator, HeadshotRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "gemini-3-pro-image-preview",
        }
    }
}

/// Builder for GeminiGenerator.
#[derive(Debug, Clone, Default)]
pub struct GeminiGeneratorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiGeneratorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL. Falls back to `HEADSHOT_API_BASE`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout (default 120s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the generator, resolving the API key.
    pub fn build(self) -> Result<GeminiGenerator> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                HeadshotError::Auth("GOOGLE_API_KEY not set and no API key provided".into())
            })?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("HEADSHOT_API_BASE").ok())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(GeminiGenerator {
            client,
            api_key,
            model: self.model,
            base_url,
            timeout,
        })
    }
}

/// Gemini headshot generator.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
    timeout: Duration,
}

impl GeminiGenerator {
    /// Creates a new `GeminiGeneratorBuilder`.
    pub fn builder() -> GeminiGeneratorBuilder {
        GeminiGeneratorBuilder::new()
    }

    /// The model this generator calls.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model.as_str())
    }

    async fn generate_impl(&self, request: &HeadshotRequest) -> Result<Option<String>> {
        let start = Instant::now();
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_headshot_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let result = extract_image(gemini_response)?;

        tracing::info!(
            model = self.model.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            produced_image = result.is_some(),
            "gemini generation finished"
        );
        Ok(result)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> HeadshotError {
        if e.is_timeout() {
            HeadshotError::Timeout(self.timeout)
        } else {
            HeadshotError::Network(e)
        }
    }
}

/// Pulls the image out of a successful response.
///
/// Safety blocks are errors; an answer without an image is `None`.
fn extract_image(response: GeminiResponse) -> Result<Option<String>> {
    // Prompt blocks come back as HTTP 200
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(HeadshotError::ContentBlocked(msg));
        }
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        tracing::debug!("gemini returned no candidates");
        return Ok(None);
    };

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(HeadshotError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            "IMAGE_OTHER" | "NO_IMAGE" => {
                tracing::debug!(finish_reason = %finish_reason, "gemini produced no image");
                return Ok(None);
            }
            _ => {} // STOP, MAX_TOKENS, etc. are normal
        }
    }

    let Some(content) = candidate.content else {
        return Ok(None);
    };

    let mut text_reply = None;
    for part in content.parts {
        if let Some(inline) = part.inline_data {
            if !inline.data.is_empty() {
                return Ok(Some(inline.data));
            }
        }
        if text_reply.is_none() {
            text_reply = part.text;
        }
    }

    if let Some(text) = text_reply {
        tracing::debug!(reply = %sanitize_error_message(&text), "gemini answered with text only");
    }
    Ok(None)
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> HeadshotError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return HeadshotError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(Duration::from_secs);
        return HeadshotError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return HeadshotError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return HeadshotError::ContentBlocked(text);
    }
    HeadshotError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl HeadshotGenerator for GeminiGenerator {
    async fn generate(&self, request: &HeadshotRequest) -> Result<Option<String>> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        match response.status().as_u16() {
            401 | 403 => Err(HeadshotError::Auth("Invalid API key".into())),
            404 => Err(HeadshotError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(HeadshotError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_headshot_request(req: &HeadshotRequest) -> Self {
        // Photo first, then the instructions
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image_format().mime_type().to_string(),
                    data: req.image.clone(),
                },
            },
            GeminiRequestPart::Text {
                text: build_prompt(&req.style()),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Attire, Background, StyleOptions};

    fn parse(json: &str) -> GeminiResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "gemini-3-pro-image-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_builder_with_explicit_key_and_base() {
        let generator = GeminiGeneratorBuilder::new()
            .api_key("test-key")
            .model(GeminiModel::NanoBananaPro)
            .base_url("http://localhost:8080/v1beta/")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(
            generator.model_url(),
            "http://localhost:8080/v1beta/models/gemini-3-pro-image-preview"
        );
        assert_eq!(generator.timeout, Duration::from_secs(5));
        assert_eq!(generator.name(), "Gemini (Google)");
    }

    #[test]
    fn test_request_construction() {
        let style = StyleOptions::new(Attire::Blazer, Background::StudioGray).with_enhanced(true);
        let req = HeadshotRequest::new("iVBORw0KGgoAAAAN", style);
        let gemini_req = GeminiRequest::from_headshot_request(&req);

        let json = serde_json::to_value(&gemini_req).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inline_data"]["data"], "iVBORw0KGgoAAAAN");
        let text = parts[1]["text"].as_str().unwrap();
        assert!(text.contains("blazer"));
        assert!(text.contains("retouching"));
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_extract_image_returns_payload_verbatim() {
        let resp = parse(
            r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your headshot"},
                        {"inlineData": {"mimeType": "image/png", "data": "ABC123"}}
                    ]
                },
                "finishReason": "STOP"
            }]
        }"#,
        );
        assert_eq!(extract_image(resp).unwrap().as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_extract_image_text_only_is_none() {
        let resp = parse(
            r#"{
            "candidates": [{
                "content": {"parts": [{"text": "I could not find a face in this photo."}]},
                "finishReason": "STOP"
            }]
        }"#,
        );
        assert_eq!(extract_image(resp).unwrap(), None);
    }

    #[test]
    fn test_extract_image_no_image_finish_reason_is_none() {
        let resp = parse(r#"{"candidates": [{"finishReason": "NO_IMAGE"}]}"#);
        assert_eq!(extract_image(resp).unwrap(), None);

        let resp = parse(r#"{"candidates": []}"#);
        assert_eq!(extract_image(resp).unwrap(), None);
    }

    #[test]
    fn test_extract_image_empty_inline_data_is_none() {
        let resp = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": ""}}]}}]}"#,
        );
        assert_eq!(extract_image(resp).unwrap(), None);
    }

    #[test]
    fn test_extract_image_safety_is_error() {
        let resp = parse(r#"{"candidates": [{"finishReason": "IMAGE_SAFETY"}]}"#);
        assert!(matches!(
            extract_image(resp),
            Err(HeadshotError::ContentBlocked(_))
        ));
    }

    #[test]
    fn test_extract_image_prompt_feedback_block() {
        let resp = parse(
            r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#,
        );
        match extract_image(resp) {
            Err(HeadshotError::ContentBlocked(msg)) => {
                assert_eq!(msg, "Prompt was blocked due to safety")
            }
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_mapping() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(401, "bad key", &headers),
            HeadshotError::Auth(_)
        ));
        assert!(matches!(
            parse_error(404, "", &headers),
            HeadshotError::InvalidRequest(_)
        ));
        assert!(matches!(
            parse_error(400, "request blocked by safety system", &headers),
            HeadshotError::ContentBlocked(_)
        ));
        assert!(matches!(
            parse_error(503, "overloaded", &headers),
            HeadshotError::Api { status: 503, .. }
        ));
    }

    #[test]
    fn test_parse_error_rate_limit_reads_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        match parse_error(429, "slow down", &headers) {
            HeadshotError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)))
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}
