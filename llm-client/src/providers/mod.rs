//! LLM provider implementations

mod gemini;
mod http;
pub mod mock;
mod openai_compatible;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    #[serde(alias = "openai")]
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::OpenRouter];

    /// Identifier used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenRouter => "OPEN_ROUTER_KEY",
        }
    }

    /// Alternate environment variables checked when `env_var` is unset
    pub fn env_var_aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GOOGLE_API_KEY"],
            Self::OpenRouter => &["OPENROUTER_API_KEY"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenRouter => "openai/gpt-4o",
        }
    }

    /// Key values shipped in sample `.env` files, treated as unset
    pub fn placeholder_key(&self) -> &'static str {
        match self {
            Self::Gemini => "your_gemini_key",
            Self::OpenRouter => "your_openrouter_key",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openrouter" | "open-router" | "open_router" | "openai" => Ok(Self::OpenRouter),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }
}

/// Create a provider instance from a resolved provider config
///
/// Fails with `ProviderNotConfigured` when the config carries no credential.
pub fn build_provider(config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn LlmProvider>> {
    let api_key = config
        .api_key()
        .ok_or(LlmError::ProviderNotConfigured {
            provider: config.kind,
        })?
        .to_string();

    match config.kind {
        ProviderKind::Gemini => Ok(Box::new(GeminiProvider::new(
            &config.model,
            api_key,
            config.base_url.as_deref(),
            timeout,
        )?)),
        ProviderKind::OpenRouter => Ok(Box::new(OpenAICompatibleProvider::openrouter(
            &config.model,
            api_key,
            config.base_url.as_deref(),
            timeout,
        )?)),
    }
}
