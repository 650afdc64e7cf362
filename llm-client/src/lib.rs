//! Shared LLM client library for the prompt-lab workspace
//!
//! Provides one call surface over hosted text-generation providers:
//! - Google Gemini (direct)
//! - OpenRouter (OpenAI-compatible, fronting OpenAI models)
//!
//! with a single fallback hop between them and per-provider usage accounting.

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod provider;
pub mod providers;

pub use client::{ClientOptions, LlmClient};
pub use config::{Config, FallbackPolicy, PinnedFallback, ProviderConfig, ProviderSettings};
pub use error::{LlmError, Result, ValidationError};
pub use ledger::{ProviderUsage, UsageLedger};
pub use provider::{GenerationRequest, GenerationResult, LlmProvider, LlmResponse, TokenUsage};
pub use providers::{MockProvider, ProviderKind, build_provider};
