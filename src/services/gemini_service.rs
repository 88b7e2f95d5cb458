// src/services/gemini_service.rs
use crate::errors::BackdropError;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use log::debug;
use reqwest::Client;
use serde_json::json;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
const VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// One inline image returned by the generative service.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Tagged result of a generation call. A response counts as image output
/// only when at least one part carries inline image data; a text-only
/// response is surfaced as `Text`, everything else as `Blocked` with the
/// finish reason the service reported.
#[derive(Debug, Clone)]
pub enum Outcome {
    Images(Vec<ImagePart>),
    Text(String),
    Blocked { reason: String },
}

/// Seam to the external generative service. The production implementation
/// is [`GeminiService`]; tests substitute a scripted fake.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Issue a multi-part generation request: optional inline source image
    /// plus an instruction string.
    async fn generate(
        &self,
        image: Option<(&[u8], &str)>,
        instruction: &str,
    ) -> Result<Outcome, BackdropError>;

    /// Submit a long-running image-to-video operation. Returns the
    /// operation handle to poll.
    async fn start_video(
        &self,
        image: (&[u8], &str),
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String, BackdropError>;

    /// Poll a video operation. `Ok(None)` while still running, `Ok(Some(uri))`
    /// once the video is available.
    async fn poll_video(&self, operation: &str) -> Result<Option<String>, BackdropError>;
}

pub struct GeminiService {
    api_key: String,
    client: Client,
}

impl GeminiService {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, BackdropError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackdropError::Generation(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackdropError::Generation(format!(
                "Service error: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BackdropError::Generation(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerativeBackend for GeminiService {
    async fn generate(
        &self,
        image: Option<(&[u8], &str)>,
        instruction: &str,
    ) -> Result<Outcome, BackdropError> {
        let mut parts = Vec::new();
        if let Some((data, mime_type)) = image {
            parts.push(json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": general_purpose::STANDARD.encode(data),
                }
            }));
        }
        parts.push(json!({ "text": instruction }));

        let url = format!("{}/models/{}:generateContent", API_BASE, IMAGE_MODEL);
        let result = self
            .post_json(
                &url,
                json!({
                    "contents": [{ "parts": parts }],
                    "generationConfig": {
                        "responseModalities": ["IMAGE", "TEXT"],
                    }
                }),
            )
            .await?;

        let candidate = &result["candidates"][0];
        let mut images = Vec::new();
        let mut text = String::new();

        if let Some(response_parts) = candidate["content"]["parts"].as_array() {
            for part in response_parts {
                if let Some(data) = part["inline_data"]["data"].as_str() {
                    let bytes = general_purpose::STANDARD.decode(data).map_err(|e| {
                        BackdropError::Generation(format!("Failed to decode image data: {}", e))
                    })?;
                    images.push(ImagePart {
                        data: bytes,
                        mime_type: part["inline_data"]["mime_type"]
                            .as_str()
                            .unwrap_or("image/png")
                            .to_string(),
                    });
                } else if let Some(t) = part["text"].as_str() {
                    text.push_str(t);
                }
            }
        }

        debug!(
            "generate: {} image part(s), {} text bytes",
            images.len(),
            text.len()
        );

        if !images.is_empty() {
            Ok(Outcome::Images(images))
        } else if !text.trim().is_empty() {
            Ok(Outcome::Text(text))
        } else {
            let reason = candidate["finishReason"]
                .as_str()
                .unwrap_or("no content returned")
                .to_string();
            Ok(Outcome::Blocked { reason })
        }
    }

    async fn start_video(
        &self,
        image: (&[u8], &str),
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String, BackdropError> {
        let (data, mime_type) = image;
        let url = format!("{}/models/{}:predictLongRunning", API_BASE, VIDEO_MODEL);
        let result = self
            .post_json(
                &url,
                json!({
                    "instances": [{
                        "prompt": prompt,
                        "image": {
                            "bytesBase64Encoded": general_purpose::STANDARD.encode(data),
                            "mimeType": mime_type,
                        }
                    }],
                    "parameters": { "aspectRatio": aspect_ratio }
                }),
            )
            .await?;

        result["name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                BackdropError::Generation("No operation handle in video response".to_string())
            })
    }

    async fn poll_video(&self, operation: &str) -> Result<Option<String>, BackdropError> {
        let url = format!("{}/{}", API_BASE, operation);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| BackdropError::Generation(format!("Poll request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackdropError::Generation(format!(
                "Poll error: {}",
                error_text
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackdropError::Generation(format!("Failed to parse poll response: {}", e)))?;

        if let Some(error) = result.get("error") {
            return Err(BackdropError::Generation(format!(
                "Video generation failed: {}",
                error["message"].as_str().unwrap_or("unknown error")
            )));
        }

        if !result["done"].as_bool().unwrap_or(false) {
            return Ok(None);
        }

        result["response"]["generateVideoResponse"]["generatedSamples"][0]["video"]["uri"]
            .as_str()
            .map(|uri| Some(uri.to_string()))
            .ok_or_else(|| {
                BackdropError::Generation("Video operation finished without a video URI".to_string())
            })
    }
}
