use crate::config::Config;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

/// Failures talking to the generation service. Display text is returned to
/// HTTP callers verbatim, so variants carrying upstream detail print it bare.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("{0}")]
    Http(String),
    #[error("{status} {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse Gemini response: {0}")]
    Parse(String),
    #[error("response candidate contains no inline image data")]
    MissingInlineData,
    #[error("{0}")]
    Other(String),
}

/// Anything that can turn a prompt into a `generateContent` response.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError>;
}

// Shortens base64 payloads inside a JSON document for logging
fn truncate_base64_in_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 {
                            let head: String = s.chars().take(50).collect();
                            *val = serde_json::Value::String(format!("{}...[truncated {} chars]", head, s.len() - head.len()));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

/// Guesses the image format from the first decoded bytes of a base64 payload.
pub fn sniff_image_type(data: &str) -> &'static str {
    let head: String = data.chars().take(16).collect();
    let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(head.as_bytes()) else {
        return "Unknown";
    };
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "PNG"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "JPEG"
    } else if bytes.starts_with(b"GIF8") {
        "GIF"
    } else if bytes.starts_with(b"RIFF") {
        "WEBP"
    } else if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") {
        "SVG"
    } else {
        "Unknown"
    }
}

/// Short log-friendly form of a base64 payload.
pub fn preview(data: &str) -> String {
    if data.len() > 50 {
        format!("{}...[{} chars total]", data.chars().take(50).collect::<String>(), data.len())
    } else {
        data.to_string()
    }
}

// Google error bodies look like {"error": {"code": 400, "message": "...", "status": "..."}}
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.endpoint();
        info!("🔗 Making request to: {}", url);

        let request_body = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "candidateCount": 1
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ API Error response: {}", error_body);
            return Err(GeminiError::Api { status: status.as_u16(), message: api_error_message(&error_body) });
        }

        let response_text = response.text().await.map_err(|e| GeminiError::Http(e.to_string()))?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let logged = match serde_json::from_str::<serde_json::Value>(&response_text) {
                Ok(mut value) => {
                    truncate_base64_in_json(&mut value);
                    value.to_string()
                }
                Err(_) => response_text.chars().take(1000).collect(),
            };
            debug!("📥 Raw Gemini API response: {}", logged);
        }

        serde_json::from_str(&response_text).map_err(|e| GeminiError::Parse(e.to_string()))
    }
}

// --- Response shape ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    pub data: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
}

impl GenerateContentResponse {
    /// A response holding one candidate with a single inline image part.
    pub fn with_image(mime_type: &str, data: &str) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Content {
                    parts: vec![Part::Inline {
                        inline_data: InlineData { data: data.to_string(), mime_type: mime_type.to_string() },
                    }],
                },
            }],
        }
    }
}

impl Candidate {
    /// First inline payload of this candidate. Image models often lead with a
    /// text part, so text parts before the image are skipped.
    pub fn inline_image(&self) -> Option<&InlineData> {
        self.content.parts.iter().find_map(|p| match p {
            Part::Inline { inline_data } => Some(inline_data),
            _ => None,
        })
    }
}
