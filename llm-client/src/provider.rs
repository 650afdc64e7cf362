use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, ValidationError};
use crate::providers::ProviderKind;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

const CONNECTION_CHECK_PROMPT: &str = "Say 'Hello' if you can receive this message.";

/// Room for models that spend part of the output budget on thinking tokens
const CONNECTION_CHECK_MAX_TOKENS: u32 = 1024;

/// Request to send to an LLM provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Pin the request to one provider instead of the client default
    pub provider: Option<ProviderKind>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens: None,
            provider: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Reject malformed requests. Out-of-range temperatures are never clamped.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ValidationError::TemperatureOutOfRange(self.temperature));
        }
        if self.max_tokens == Some(0) {
            return Err(ValidationError::ZeroMaxTokens);
        }
        Ok(())
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Outcome of one successful upstream call, as handed to callers
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub provider: ProviderKind,
    pub latency: Duration,
    pub temperature: f32,
    /// Set when the primary provider failed and this result came from the fallback
    pub used_fallback: bool,
}

impl GenerationResult {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: &GenerationRequest) -> Result<LlmResponse>;

    /// Send a minimal request to confirm credentials and reachability
    ///
    /// Never errors: any failure is reported as `false`.
    async fn check_connection(&self) -> bool {
        let probe = GenerationRequest::new(CONNECTION_CHECK_PROMPT, 0.1)
            .with_max_tokens(CONNECTION_CHECK_MAX_TOKENS);
        match self.complete(&probe).await {
            Ok(_) => true,
            Err(e) => {
                log::debug!("Connection check for {} failed: {}", self.name(), e);
                false
            }
        }
    }

    /// Which backend this provider talks to
    fn kind(&self) -> ProviderKind;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Model identifier sent upstream
    fn model(&self) -> &str;
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        (**self).complete(request).await
    }

    async fn check_connection(&self) -> bool {
        (**self).check_connection().await
    }

    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}
