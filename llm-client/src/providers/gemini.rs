//! Google Gemini provider
//!
//! Direct HTTP implementation for the Generative Language API
//! (`models/{model}:generateContent`).

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ProviderKind;
use super::http::{build_client, error_from_response, map_decode_error, map_send_error};
use crate::error::{LlmError, Result};
use crate::provider::{GenerationRequest, LlmProvider, LlmResponse, TokenUsage};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Provider for direct Gemini API calls
pub struct GeminiProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(
        model: &str,
        api_key: String,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            model: model.to_string(),
            api_key,
            base_url: base_url
                .unwrap_or(GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: build_client(timeout)?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    ///
    /// A candidate with no text (e.g. the output budget went to thinking
    /// tokens) is an invalid response, not an empty success.
    fn text(&self) -> Result<String> {
        let candidate = self.candidates.first().ok_or_else(|| {
            LlmError::InvalidResponse("response contained no candidates".into())
        })?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(LlmError::InvalidResponse(format!(
                "candidate contained no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        let api_request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let url = self.endpoint();
        debug!("POST {} (temperature: {})", url, request.temperature);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let api_response: GenerateContentResponse =
            response.json().await.map_err(map_decode_error)?;

        let content = api_response.text()?;

        let usage = api_response
            .usage_metadata
            .as_ref()
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: api_response
                .model_version
                .unwrap_or_else(|| self.model.clone()),
            usage,
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "Summarize" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: Some(1000),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Summarize");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " world"}]}}],
            "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 2, "totalTokenCount": 9}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().unwrap(), "Hello world");
        let usage = response.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 7);
        assert_eq!(usage.candidates_token_count, 2);
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(matches!(response.text(), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_candidate_without_text_is_invalid() {
        let body = r#"{
            "candidates": [{"content": {"role": "model"}, "finishReason": "MAX_TOKENS"}],
            "usageMetadata": {"promptTokenCount": 10, "totalTokenCount": 10}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        match response.text() {
            Err(LlmError::InvalidResponse(message)) => assert!(message.contains("MAX_TOKENS")),
            other => panic!("expected InvalidResponse, got {:?}", other),
        }

        let non_text = r#"{"candidates": [{"content": {"parts": [{"inlineData": {}}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(non_text).unwrap();
        assert!(response.text().is_err());
    }

    #[test]
    fn test_endpoint_includes_model() {
        let provider = GeminiProvider::new(
            "gemini-2.5-flash",
            "key".into(),
            Some("http://127.0.0.1:1234/"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://127.0.0.1:1234/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
