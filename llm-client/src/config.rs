use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::providers::ProviderKind;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider used when a request does not pin one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<ProviderKind>,

    /// Priority order for picking the default and the fallback provider
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<ProviderKind>,

    /// Per-request transport timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Output token cap applied by the CLI when none is given
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Provider-specific configuration, keyed by provider id ("gemini", "openrouter")
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

fn default_provider_order() -> Vec<ProviderKind> {
    ProviderKind::ALL.to_vec()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_true() -> bool {
    true
}

/// How the client reacts when the primary provider's call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Try the next available provider once after a failed call
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Behavior for requests that pin an explicit provider
    #[serde(default)]
    pub on_pinned: PinnedFallback,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            on_pinned: PinnedFallback::default(),
        }
    }
}

impl FallbackPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            on_pinned: PinnedFallback::FailFast,
        }
    }

    /// Whether a failed call may hop to the fallback provider
    pub fn allows(&self, pinned: bool) -> bool {
        self.enabled && (!pinned || self.on_pinned == PinnedFallback::Fallback)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinnedFallback {
    /// A pinned request reports the pinned provider's failure
    #[default]
    FailFast,
    /// A pinned request still hops to the fallback provider
    Fallback,
}

/// Provider-specific settings as written in the config file
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Resolved, immutable configuration for one backend
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: Option<String>,
    api_key: Option<String>,
}

impl ProviderConfig {
    /// Create a config with the provider's default model
    ///
    /// Blank and placeholder keys are treated as missing.
    pub fn new(kind: ProviderKind, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != kind.placeholder_key());
        Self {
            kind,
            model: kind.default_model().to_string(),
            base_url: None,
            api_key,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// A provider is available when a credential was configured at startup
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("available", &self.is_available())
            .finish()
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| LlmError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/prompt-lab/llm.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(LlmError::ConfigError("timeout_secs must be positive".into()));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::ConfigError("max_tokens must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get provider settings by provider kind
    pub fn get_provider_settings(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.get(kind.as_str())
    }

    /// Resolve every known provider, in priority order, using the process environment
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        self.provider_configs_with(|name| std::env::var(name).ok())
    }

    /// Resolve providers with a custom environment lookup
    ///
    /// Providers missing from `provider_order` are appended after it.
    pub fn provider_configs_with<F>(&self, env: F) -> Vec<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut order = Vec::new();
        for kind in self.provider_order.iter().chain(ProviderKind::ALL.iter()) {
            if !order.contains(kind) {
                order.push(*kind);
            }
        }

        order
            .into_iter()
            .map(|kind| {
                let settings = self.get_provider_settings(kind);
                let api_key = settings
                    .and_then(|s| s.api_key.clone())
                    .or_else(|| {
                        std::iter::once(kind.env_var())
                            .chain(kind.env_var_aliases().iter().copied())
                            .find_map(&env)
                    });

                let mut config = ProviderConfig::new(kind, api_key);
                if let Some(model) = settings.and_then(|s| s.model.clone()) {
                    config = config.with_model(model);
                }
                if let Some(base_url) = settings.and_then(|s| s.base_url.clone()) {
                    config = config.with_base_url(base_url);
                }
                config
            })
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            provider_order: default_provider_order(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            fallback: FallbackPolicy::default(),
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.provider_order,
            vec![ProviderKind::Gemini, ProviderKind::OpenRouter]
        );
        assert_eq!(config.timeout_secs, 60);
        assert!(config.fallback.enabled);
        assert_eq!(config.fallback.on_pinned, PinnedFallback::FailFast);
    }

    #[test]
    fn test_parse_full_file() {
        let toml_str = r#"
            default_provider = "openrouter"
            provider_order = ["openrouter", "gemini"]
            timeout_secs = 15

            [fallback]
            enabled = true
            on_pinned = "fallback"

            [providers.gemini]
            api_key = "g-key"
            model = "gemini-2.5-pro"

            [providers.openrouter]
            base_url = "http://localhost:8080/v1"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_provider, Some(ProviderKind::OpenRouter));
        assert_eq!(config.fallback.on_pinned, PinnedFallback::Fallback);
        assert_eq!(config.max_tokens, 1000);

        let resolved = config.provider_configs_with(no_env);
        assert_eq!(resolved[0].kind, ProviderKind::OpenRouter);
        assert!(!resolved[0].is_available());
        assert_eq!(resolved[0].base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(resolved[1].model, "gemini-2.5-pro");
        assert_eq!(resolved[1].api_key(), Some("g-key"));
    }

    #[test]
    fn test_env_credentials_and_placeholders() {
        let config = Config::default();
        let resolved = config.provider_configs_with(|name| match name {
            "GEMINI_API_KEY" => Some("your_gemini_key".to_string()),
            "OPENROUTER_API_KEY" => Some("or-key".to_string()),
            _ => None,
        });

        assert_eq!(resolved[0].kind, ProviderKind::Gemini);
        assert!(!resolved[0].is_available());
        assert_eq!(resolved[1].api_key(), Some("or-key"));
        assert_eq!(resolved[1].model, "openai/gpt-4o");
    }

    #[test]
    fn test_config_key_wins_over_env() {
        let mut config = Config::default();
        config.providers.insert(
            "gemini".to_string(),
            ProviderSettings {
                api_key: Some("from-file".into()),
                ..Default::default()
            },
        );
        let resolved = config.provider_configs_with(|_| Some("from-env".to_string()));
        assert_eq!(resolved[0].api_key(), Some("from-file"));
    }

    #[test]
    fn test_order_is_completed_with_missing_providers() {
        let config = Config {
            provider_order: vec![ProviderKind::OpenRouter],
            ..Default::default()
        };
        let kinds: Vec<_> = config
            .provider_configs_with(no_env)
            .iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(kinds, vec![ProviderKind::OpenRouter, ProviderKind::Gemini]);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let settings = ProviderSettings {
            api_key: Some("super-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", settings).contains("super-secret"));

        let config = ProviderConfig::new(ProviderKind::Gemini, Some("super-secret".into()));
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_pinned_fallback_policy() {
        let fail_fast = FallbackPolicy::default();
        assert!(fail_fast.allows(false));
        assert!(!fail_fast.allows(true));

        let always = FallbackPolicy {
            enabled: true,
            on_pinned: PinnedFallback::Fallback,
        };
        assert!(always.allows(true));
        assert!(!FallbackPolicy::disabled().allows(false));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/llm.toml");

        let mut config = Config::default();
        config.default_provider = Some(ProviderKind::Gemini);
        config.timeout_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_provider, Some(ProviderKind::Gemini));
        assert_eq!(loaded.timeout_secs, 5);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.default_provider.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.toml");
        std::fs::write(&path, "timeout_secs = 0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path().unwrap();
        assert!(path.to_string_lossy().contains(".config/prompt-lab/llm.toml"));
    }
}
