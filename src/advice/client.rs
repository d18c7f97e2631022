//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! The API key travels in the `x-goog-api-key` header so it never appears in
//! a logged URL.

use serde::Deserialize;

use crate::error::TrackerError;

use super::AdviceConfig;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct AdviceClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl AdviceClient {
    pub fn new(api_key: &str, config: &AdviceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            api_key: api_key.to_string(),
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
        }
    }

    /// Send one prompt and return the concatenated reply text (possibly empty).
    pub async fn generate(&self, prompt: &str) -> Result<String, TrackerError> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.clone())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::AdviceUnavailable(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(TrackerError::AdviceUnavailable(format!(
                "API error {}: {}",
                status, text
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| TrackerError::AdviceUnavailable(format!("bad response: {}", e)))?;

        Ok(reply_text(parsed))
    }
}

/// Text of the first candidate, parts joined.
fn reply_text(resp: GenerateResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
