use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("no API key configured (set GOOGLE_API_KEY or PORTFOLIO_API_KEY)")]
    MissingApiKey,
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion backend answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("completion backend returned no text")]
    Empty,
}

/// Anything that turns a prompt into one block of generated text.
pub trait CompletionEngine {
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiEngine {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiEngine {
    pub fn new(settings: &Settings) -> Result<Self, CompletionError> {
        if settings.api_key.trim().is_empty() {
            return Err(CompletionError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(CompletionError::Client)?;
        Ok(GeminiEngine {
            client,
            endpoint: settings.gemini_endpoint.trim_end_matches('/').to_string(),
            model: settings.gemini_model.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionEngine for GeminiEngine {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "calling generateContent"
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message: api_error_message(&raw),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(CompletionError::Empty);
        }
        info!("Model {} returned {} chars", self.model, text.chars().count());
        Ok(text)
    }
}

// ── Wire format ──

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn api_error_message(raw: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(raw)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| raw.trim().chars().take(300).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part { text: Some("hi".into()) }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }] })
        );
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"1) Lesson"},{"text":" Content"}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "1) Lesson Content");
    }

    #[test]
    fn blocked_response_is_empty() {
        let raw = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn error_message_extraction() {
        let raw = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(raw), "API key not valid.");
        assert_eq!(api_error_message("  Bad Gateway "), "Bad Gateway");
    }

    #[test]
    fn missing_key_rejected() {
        let settings = Settings::default();
        assert!(matches!(GeminiEngine::new(&settings), Err(CompletionError::MissingApiKey)));
    }

    #[test]
    fn endpoint_trailing_slash_trimmed() {
        let settings = Settings {
            api_key: "k".into(),
            gemini_endpoint: "http://localhost:8080/v1beta/".into(),
            ..Settings::default()
        };
        let engine = GeminiEngine::new(&settings).unwrap();
        assert_eq!(engine.endpoint, "http://localhost:8080/v1beta");
        assert_eq!(engine.model(), "gemini-1.5-pro");
    }
}
