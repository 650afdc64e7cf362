//! Unified client over the configured providers
//!
//! Holds the available providers in priority order, picks the one a request
//! should go to, retries at most once against a fallback provider, and
//! keeps the usage ledger.

use log::{debug, info, warn};
use std::time::Instant;

use crate::config::{Config, FallbackPolicy};
use crate::error::{LlmError, Result};
use crate::ledger::UsageLedger;
use crate::provider::{GenerationRequest, GenerationResult, LlmProvider, LlmResponse};
use crate::providers::{ProviderKind, build_provider};

/// Selection and fallback settings for an `LlmClient`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientOptions {
    /// Provider used when a request does not pin one; first available otherwise
    pub default_provider: Option<ProviderKind>,
    pub fallback: FallbackPolicy,
}

impl ClientOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_provider: config.default_provider,
            fallback: config.fallback,
        }
    }
}

pub struct LlmClient {
    /// Available providers, highest priority first
    providers: Vec<Box<dyn LlmProvider>>,
    default_provider: ProviderKind,
    fallback: FallbackPolicy,
    ledger: UsageLedger,
}

impl LlmClient {
    /// Build a client from the providers that have credentials configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.timeout();
        let mut providers = Vec::new();

        for provider_config in config.provider_configs() {
            if !provider_config.is_available() {
                debug!(
                    "Skipping {}: no credential configured",
                    provider_config.kind
                );
                continue;
            }
            providers.push(build_provider(&provider_config, timeout)?);
        }

        Self::new(providers, ClientOptions::from_config(config))
    }

    /// Create a client over already-constructed providers, highest priority first
    ///
    /// Fails when no provider is given or when the requested default is not
    /// among them.
    pub fn new(providers: Vec<Box<dyn LlmProvider>>, options: ClientOptions) -> Result<Self> {
        let first = providers
            .first()
            .map(|p| p.kind())
            .ok_or(LlmError::NoProvidersAvailable)?;

        let default_provider = match options.default_provider {
            Some(kind) if providers.iter().any(|p| p.kind() == kind) => kind,
            Some(kind) => return Err(LlmError::ProviderNotConfigured { provider: kind }),
            None => first,
        };

        info!(
            "LLM client ready: providers [{}], default {}",
            providers
                .iter()
                .map(|p| p.kind().as_str())
                .collect::<Vec<_>>()
                .join(", "),
            default_provider
        );

        Ok(Self {
            providers,
            default_provider,
            fallback: options.fallback,
            ledger: UsageLedger::new(),
        })
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// Available providers, in priority order
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Model used for a provider, if it is available
    pub fn model_for(&self, kind: ProviderKind) -> Option<&str> {
        self.provider(kind).map(|p| p.model())
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    fn provider(&self, kind: ProviderKind) -> Option<&dyn LlmProvider> {
        self.providers
            .iter()
            .find(|p| p.kind() == kind)
            .map(|p| p.as_ref())
    }

    /// First available provider other than `primary`
    fn fallback_for(&self, primary: ProviderKind) -> Option<&dyn LlmProvider> {
        self.providers
            .iter()
            .find(|p| p.kind() != primary)
            .map(|p| p.as_ref())
    }

    /// Generate text for one request
    ///
    /// Validation and configuration errors are returned before any upstream
    /// call. An upstream failure is retried once against the fallback provider
    /// when the fallback policy allows it; a second failure is terminal.
    pub async fn generate(&mut self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;

        let pinned = request.provider.is_some();
        let primary_kind = request.provider.unwrap_or(self.default_provider);
        let primary = self
            .provider(primary_kind)
            .ok_or(LlmError::ProviderNotConfigured {
                provider: primary_kind,
            })?;

        let started = Instant::now();
        let primary_err = match attempt(primary, request).await {
            Ok(response) => {
                return Ok(self.finish(primary_kind, response, request, started, false));
            }
            Err(err) => err,
        };

        if !primary_err.is_upstream() {
            return Err(primary_err);
        }

        let fallback = if self.fallback.allows(pinned) {
            self.fallback_for(primary_kind)
        } else {
            None
        };

        let Some(fallback) = fallback else {
            return Err(primary_err.into_api_failure(primary_kind, false));
        };

        let fallback_kind = fallback.kind();
        warn!(
            "{} failed ({}); falling back to {}",
            primary_kind, primary_err, fallback_kind
        );

        let started = Instant::now();
        match attempt(fallback, request).await {
            Ok(response) => Ok(self.finish(fallback_kind, response, request, started, true)),
            Err(err) if err.is_upstream() => {
                warn!("Fallback {} also failed: {}", fallback_kind, err);
                Err(err.into_api_failure(fallback_kind, true))
            }
            Err(err) => Err(err),
        }
    }

    /// Run requests one after another, keeping every outcome in input order
    ///
    /// A failed request does not stop the batch.
    pub async fn generate_batch(
        &mut self,
        requests: &[GenerationRequest],
    ) -> Vec<Result<GenerationResult>> {
        let mut results = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            debug!("Batch request {}/{}", i + 1, requests.len());
            let outcome = self.generate(request).await;
            if let Err(e) = &outcome {
                warn!("Batch request {} failed: {}", i + 1, e);
            }
            results.push(outcome);
        }
        results
    }

    /// Probe a provider; `false` if it is unavailable or the probe fails
    pub async fn check_connection(&self, kind: ProviderKind) -> bool {
        match self.provider(kind) {
            Some(provider) => provider.check_connection().await,
            None => {
                debug!("Connection check skipped: {} not available", kind);
                false
            }
        }
    }

    fn finish(
        &mut self,
        kind: ProviderKind,
        response: LlmResponse,
        request: &GenerationRequest,
        started: Instant,
        used_fallback: bool,
    ) -> GenerationResult {
        self.ledger.record(kind, response.usage);
        debug!(
            "{}: {} in / {} out tokens ({} requests so far)",
            kind,
            response.usage.input_tokens,
            response.usage.output_tokens,
            self.ledger.request_count(kind)
        );

        GenerationResult {
            text: response.content,
            model: response.model,
            usage: response.usage,
            provider: kind,
            latency: started.elapsed(),
            temperature: request.temperature,
            used_fallback,
        }
    }
}

async fn attempt(provider: &dyn LlmProvider, request: &GenerationRequest) -> Result<LlmResponse> {
    debug!(
        "Sending request to {} (model: {})",
        provider.name(),
        provider.model()
    );
    provider.complete(request).await
}
