// src/analysis/gemini.rs
use async_trait::async_trait;
use log::*;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AnalysisError, GenerationConfig, TextGenerator};
use crate::config::AnalysisConfig;

/// Shown when the service answers without any text.
pub const FALLBACK_ANALYSIS: &str = "ไม่สามารถสร้างการวิเคราะห์ได้";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Client for Google's `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, AnalysisError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(&config.endpoint, config.timeout_secs.map(Duration::from_secs))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, AnalysisError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: config,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("X-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        let data: GenerateResponse = response.json().await?;
        Ok(data.first_text().unwrap_or_else(|| {
            warn!("Gemini response contained no text");
            FALLBACK_ANALYSIS.to_string()
        }))
    }
}

fn status_error(status: StatusCode, body: String) -> AnalysisError {
    match status {
        StatusCode::BAD_REQUEST => AnalysisError::InvalidKey,
        StatusCode::FORBIDDEN => AnalysisError::Forbidden,
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimited,
        other => AnalysisError::Api {
            status: other.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let config = GenerationConfig::default();
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: &config,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"parts": [{"text": "hello"}]}],
                "generationConfig": {
                    "temperature": 0.7,
                    "topK": 40,
                    "topP": 0.95,
                    "maxOutputTokens": 2048
                }
            })
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let data: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "## สรุป"}], "role": "model"}}]
        }))
        .unwrap();
        assert_eq!(data.first_text().as_deref(), Some("## สรุป"));

        let empty: GenerateResponse = serde_json::from_value(json!({"promptFeedback": {}})).unwrap();
        assert_eq!(empty.first_text(), None);

        let no_parts: GenerateResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(no_parts.first_text(), None);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, String::new()),
            AnalysisError::InvalidKey
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AnalysisError::RateLimited
        ));
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()) {
            AnalysisError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = GeminiClient::new("http://127.0.0.1:9/generate", Some(Duration::from_secs(2))).unwrap();
        let result = client
            .generate("key", "prompt", &GenerationConfig::connection_test())
            .await;
        assert!(matches!(result, Err(AnalysisError::Network(_))));
    }
}
