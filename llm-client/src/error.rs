use thiserror::Error;

use crate::providers::ProviderKind;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "No LLM providers available. Set GEMINI_API_KEY or OPEN_ROUTER_KEY, or add an api_key to the config file."
    )]
    NoProvidersAvailable,

    #[error(
        "Provider '{provider}' is not configured. Set {} or add [providers.{provider}] api_key to the config file.",
        provider.env_var()
    )]
    ProviderNotConfigured { provider: ProviderKind },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(
        "{provider} request failed{}: {reason}{}",
        status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default(),
        if *fallback_attempted { " (after fallback)" } else { "" }
    )]
    ApiFailure {
        provider: ProviderKind,
        reason: String,
        status_code: Option<u16>,
        fallback_attempted: bool,
    },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// A request rejected before any network call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("temperature {0} is outside the valid range [0.0, 2.0]")]
    TemperatureOutOfRange(f32),

    #[error("max_tokens must be a positive integer")]
    ZeroMaxTokens,
}

impl LlmError {
    /// Whether this error came from an upstream call and may be retried
    /// once against the fallback provider.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::ServerOverloaded { .. }
                | LlmError::ApiError { .. }
                | LlmError::Timeout
                | LlmError::Transport(_)
                | LlmError::InvalidResponse(_)
        )
    }

    /// HTTP status carried by an upstream error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } => Some(429),
            LlmError::ServerOverloaded { .. } => Some(503),
            LlmError::ApiError { status_code, .. } | LlmError::ApiFailure { status_code, .. } => {
                *status_code
            }
            _ => None,
        }
    }

    /// Fold an upstream error into the terminal failure reported to callers
    pub(crate) fn into_api_failure(self, provider: ProviderKind, fallback_attempted: bool) -> Self {
        let status_code = self.status_code();
        LlmError::ApiFailure {
            provider,
            reason: self.to_string(),
            status_code,
            fallback_attempted,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(LlmError::Timeout.is_upstream());
        assert!(LlmError::RateLimited { retry_after: None }.is_upstream());
        assert!(
            LlmError::ApiError {
                message: "bad gateway".into(),
                status_code: Some(502),
            }
            .is_upstream()
        );
        assert!(!LlmError::NoProvidersAvailable.is_upstream());
        assert!(!LlmError::Validation(ValidationError::EmptyPrompt).is_upstream());
    }

    #[test]
    fn test_api_failure_keeps_status() {
        let err = LlmError::RateLimited {
            retry_after: Some(30),
        }
        .into_api_failure(ProviderKind::Gemini, true);

        match err {
            LlmError::ApiFailure {
                provider,
                reason,
                status_code,
                fallback_attempted,
            } => {
                assert_eq!(provider, ProviderKind::Gemini);
                assert!(reason.contains("Retry after 30 seconds"));
                assert_eq!(status_code, Some(429));
                assert!(fallback_attempted);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_configuration_hint_names_env_var() {
        let msg = LlmError::ProviderNotConfigured {
            provider: ProviderKind::OpenRouter,
        }
        .to_string();
        assert!(msg.contains("OPEN_ROUTER_KEY"));
        assert!(msg.contains("[providers.openrouter]"));
    }
}
