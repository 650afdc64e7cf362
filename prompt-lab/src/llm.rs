//! LLM client wrapper for prompt-lab
//!
//! Loads the shared configuration and builds the unified client.

use anyhow::{Context, Result};
use llm_client::{
    Config, GenerationRequest, GenerationResult, LlmClient, LlmError, ProviderKind, UsageLedger,
};
use log::info;

/// Client plus the per-run settings every request shares
pub struct Lab {
    client: LlmClient,
    provider: Option<ProviderKind>,
    max_tokens: u32,
}

impl Lab {
    /// Create the client from the config file and environment
    ///
    /// `provider` pins every request of this run to one provider.
    pub fn connect(config: &Config, provider: Option<ProviderKind>) -> Result<Self> {
        let client = LlmClient::from_config(config).context("Failed to initialize LLM client")?;
        let lab = Self::new(client, provider, config.max_tokens)?;

        let kind = provider.unwrap_or(lab.client.default_provider());
        info!(
            "Using LLM provider: {} (model: {})",
            kind,
            lab.client.model_for(kind).unwrap_or("unavailable")
        );

        Ok(lab)
    }

    /// Fails up front when the pinned provider has no credential
    pub fn new(
        client: LlmClient,
        provider: Option<ProviderKind>,
        max_tokens: u32,
    ) -> llm_client::Result<Self> {
        if let Some(kind) = provider {
            if !client.available_providers().contains(&kind) {
                return Err(LlmError::ProviderNotConfigured { provider: kind });
            }
        }
        Ok(Self {
            client,
            provider,
            max_tokens,
        })
    }

    /// Build a request carrying this run's provider pin and token cap
    pub fn request(&self, prompt: String, temperature: f32) -> GenerationRequest {
        let request = GenerationRequest::new(prompt, temperature).with_max_tokens(self.max_tokens);
        match self.provider {
            Some(kind) => request.with_provider(kind),
            None => request,
        }
    }

    pub async fn generate(
        &mut self,
        prompt: String,
        temperature: f32,
    ) -> llm_client::Result<GenerationResult> {
        let request = self.request(prompt, temperature);
        self.client.generate(&request).await
    }

    pub async fn generate_batch(
        &mut self,
        prompts: Vec<String>,
        temperature: f32,
    ) -> Vec<llm_client::Result<GenerationResult>> {
        let requests: Vec<_> = prompts
            .into_iter()
            .map(|p| self.request(p, temperature))
            .collect();
        self.client.generate_batch(&requests).await
    }

    pub fn ledger(&self) -> &UsageLedger {
        self.client.ledger()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use llm_client::{ClientOptions, LlmError, LlmProvider, MockProvider};
    use std::sync::Arc;

    pub fn lab_with(provider: Arc<MockProvider>) -> Lab {
        let providers: Vec<Box<dyn LlmProvider>> = vec![Box::new(provider)];
        let client = LlmClient::new(providers, ClientOptions::default()).unwrap();
        Lab::new(client, None, 1000).unwrap()
    }

    pub fn answering(text: &str) -> Arc<MockProvider> {
        Arc::new(MockProvider::always_succeeds(ProviderKind::Gemini, text).with_usage(100, 20))
    }

    pub fn failing_on(calls: &[usize], text: &str) -> Arc<MockProvider> {
        Arc::new(
            MockProvider::fails_on_calls(
                ProviderKind::Gemini,
                calls,
                LlmError::ServerOverloaded {
                    message: "overloaded".into(),
                },
                text,
            )
            .with_usage(100, 20),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use llm_client::{ClientOptions, LlmProvider};

    #[test]
    fn test_pinning_unavailable_provider_fails_up_front() {
        let providers: Vec<Box<dyn LlmProvider>> = vec![Box::new(answering("ok"))];
        let client = LlmClient::new(providers, ClientOptions::default()).unwrap();

        let err = Lab::new(client, Some(ProviderKind::OpenRouter), 1000)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LlmError::ProviderNotConfigured {
                provider: ProviderKind::OpenRouter
            }
        ));
    }

    #[tokio::test]
    async fn test_pinning_available_provider() {
        let provider = answering("ok");
        let providers: Vec<Box<dyn LlmProvider>> = vec![Box::new(provider.clone())];
        let client = LlmClient::new(providers, ClientOptions::default()).unwrap();
        let mut lab = Lab::new(client, Some(ProviderKind::Gemini), 1000).unwrap();

        lab.generate("hello".into(), 0.4).await.unwrap();
        assert_eq!(provider.requests()[0].provider, Some(ProviderKind::Gemini));
    }

    #[tokio::test]
    async fn test_requests_carry_token_cap() {
        let provider = answering("ok");
        let mut lab = lab_with(provider.clone());

        lab.generate("hello".into(), 0.4).await.unwrap();

        let sent = provider.requests();
        assert_eq!(sent[0].max_tokens, Some(1000));
        assert_eq!(sent[0].temperature, 0.4);
        assert!(sent[0].provider.is_none());
    }
}
