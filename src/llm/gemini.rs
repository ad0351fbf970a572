//! Gemini `generateContent` client

use super::{LlmClient, LlmError};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    /// `None` when no API key is configured
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Some(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Map an unsuccessful HTTP status to an error
fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Unauthorized(body),
        400 | 404 => LlmError::BadRequest(body),
        408 => LlmError::Timeout,
        429 => LlmError::RateLimited,
        _ => LlmError::Server { status, body },
    }
}

/// Concatenated text parts of the first candidate
fn response_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "responseMimeType": "application/json",
                "maxOutputTokens": self.max_output_tokens,
            },
        });

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), body));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        let text = response_text(parsed);
        debug!(model = %self.model, chars = text.len(), "gemini response");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(status_error(401, String::new()), LlmError::Unauthorized(String::new()));
        assert_eq!(status_error(403, "no".into()), LlmError::Unauthorized("no".into()));
        assert_eq!(status_error(400, String::new()), LlmError::BadRequest(String::new()));
        assert_eq!(status_error(429, String::new()), LlmError::RateLimited);
        assert!(matches!(status_error(503, String::new()), LlmError::Server { status: 503, .. }));
    }

    #[test]
    fn text_parts_are_joined() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response_text(parsed), "{\"a\": 1}");

        let empty: GenerateResponse = serde_json::from_str(r#"{"promptFeedback": {}}"#).unwrap();
        assert_eq!(response_text(empty), "");
    }

    #[test]
    fn url_uses_model() {
        let config = LlmConfig {
            api_key: Some("k".into()),
            endpoint: "https://example.test/v1beta/".into(),
            model: "gemini-2.0-flash".into(),
            ..LlmConfig::default()
        };
        let client = GeminiClient::from_config(&config).unwrap();
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.model_id(), "gemini-2.0-flash");
        assert!(GeminiClient::from_config(&LlmConfig::default()).is_none());
    }
}
