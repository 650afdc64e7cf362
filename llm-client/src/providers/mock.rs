//! Mock LLM provider for testing
//!
//! Provides a configurable mock provider that can simulate various behaviors
//! like failures and successful responses, and records every request it
//! receives so tests can assert how often (and with what) it was called.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ProviderKind;
use crate::error::{LlmError, Result};
use crate::provider::{GenerationRequest, LlmProvider, LlmResponse, TokenUsage};

/// A mock provider for testing fallback and accounting behavior
pub struct MockProvider {
    kind: ProviderKind,
    /// Calls (0-based) that fail with `fail_with`
    failing_calls: FailurePlan,
    fail_with: Option<LlmError>,
    success_response: String,
    usage: TokenUsage,
    requests: Mutex<Vec<GenerationRequest>>,
    call_count: AtomicUsize,
}

enum FailurePlan {
    Never,
    Always,
    FirstN(usize),
    Only(Vec<usize>),
}

impl FailurePlan {
    fn fails(&self, call: usize) -> bool {
        match self {
            FailurePlan::Never => false,
            FailurePlan::Always => true,
            FailurePlan::FirstN(n) => call < *n,
            FailurePlan::Only(calls) => calls.contains(&call),
        }
    }
}

impl MockProvider {
    fn with_plan(kind: ProviderKind, plan: FailurePlan, error: Option<LlmError>) -> Self {
        Self {
            kind,
            failing_calls: plan,
            fail_with: error,
            success_response: String::new(),
            usage: TokenUsage::default(),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(kind: ProviderKind, response: &str) -> Self {
        let mut provider = Self::with_plan(kind, FailurePlan::Never, None);
        provider.success_response = response.to_string();
        provider
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(kind: ProviderKind, error: LlmError) -> Self {
        Self::with_plan(kind, FailurePlan::Always, Some(error))
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(
        kind: ProviderKind,
        n: usize,
        error: LlmError,
        response: &str,
    ) -> Self {
        let mut provider = Self::with_plan(kind, FailurePlan::FirstN(n), Some(error));
        provider.success_response = response.to_string();
        provider
    }

    /// Create a provider that fails only on the given 0-based call numbers
    pub fn fails_on_calls(
        kind: ProviderKind,
        calls: &[usize],
        error: LlmError,
        response: &str,
    ) -> Self {
        let mut provider = Self::with_plan(kind, FailurePlan::Only(calls.to_vec()), Some(error));
        provider.success_response = response.to_string();
        provider
    }

    /// Token counts reported on every successful call
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = TokenUsage::new(input_tokens, output_tokens);
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.failing_calls.fails(call_num) {
            if let Some(err) = self.fail_with.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(LlmResponse {
            content: self.success_response.clone(),
            model: "mock-model".to_string(),
            usage: self.usage,
        })
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::Timeout => LlmError::Timeout,
        LlmError::Transport(s) => LlmError::Transport(s.clone()),
        LlmError::InvalidResponse(s) => LlmError::InvalidResponse(s.clone()),
        // Anything else is not something an upstream call produces
        other => LlmError::Transport(format!("mock: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider =
            MockProvider::always_succeeds(ProviderKind::Gemini, "success").with_usage(3, 4);
        let request = GenerationRequest::new("test", 0.7);

        let response = provider.complete(&request).await.unwrap();
        assert_eq!(response.content, "success");
        assert_eq!(response.usage, TokenUsage::new(3, 4));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.requests(), vec![request]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(
            ProviderKind::OpenRouter,
            LlmError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
        );
        let request = GenerationRequest::new("test", 0.7);

        for _ in 0..3 {
            assert!(provider.complete(&request).await.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider = MockProvider::fails_then_succeeds(
            ProviderKind::Gemini,
            2,
            LlmError::Timeout,
            "success",
        );
        let request = GenerationRequest::new("test", 0.7);

        assert!(provider.complete(&request).await.is_err());
        assert!(provider.complete(&request).await.is_err());

        let result = provider.complete(&request).await.unwrap();
        assert_eq!(result.content, "success");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_selected_calls() {
        let provider = MockProvider::fails_on_calls(
            ProviderKind::Gemini,
            &[1],
            LlmError::RateLimited { retry_after: None },
            "ok",
        );
        let request = GenerationRequest::new("test", 0.7);

        assert!(provider.complete(&request).await.is_ok());
        assert!(matches!(
            provider.complete(&request).await,
            Err(LlmError::RateLimited { .. })
        ));
        assert!(provider.complete(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_default_connection_check() {
        let healthy = MockProvider::always_succeeds(ProviderKind::Gemini, "Hello");
        let broken = MockProvider::always_fails(ProviderKind::Gemini, LlmError::Timeout);
        assert!(healthy.check_connection().await);
        assert!(!broken.check_connection().await);
    }
}
