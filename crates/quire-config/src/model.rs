// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use quire_core::{ProviderKind, QuireError};
use serde::{Deserialize, Serialize};

/// Top-level Quire configuration.
///
/// Every section is optional and falls back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuireConfig {
    /// Journal style and logging settings.
    #[serde(default)]
    pub journal: JournalConfig,

    /// LLM provider selection and credentials.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Memory extraction and consolidation settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Journal output style.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JournalConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Language the journal entry should be written in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Writing tone hint, e.g. "reflective" or "concise".
    #[serde(default = "default_tone")]
    pub tone: String,

    /// Maximum number of fragments placed in a single prompt.
    /// The most recent fragments win when the cap is exceeded.
    #[serde(default = "default_max_fragments")]
    pub max_fragments: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            language: default_language(),
            tone: default_tone(),
            max_fragments: default_max_fragments(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_tone() -> String {
    "reflective".to_string()
}

fn default_max_fragments() -> usize {
    200
}

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Vendor to talk to.
    #[serde(default = "default_kind")]
    pub kind: ProviderKind,

    /// Model identifier. `None` uses the vendor default.
    #[serde(default)]
    pub model: Option<String>,

    /// API key. `None` falls back to the vendor environment variable
    /// (e.g. `OPENAI_API_KEY`).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Custom base URL overriding the vendor default.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Output token budget for journal generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout applied to the connectivity probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Bounds connecting and each idle gap between response reads. A
    /// non-streaming call is also capped by it as a whole; a stream that
    /// keeps delivering text runs as long as it needs.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model: None,
            api_key: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
            probe_timeout_secs: default_probe_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// The configured model, or the vendor default when none is set.
    pub fn model_name(&self) -> Option<String> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| self.kind.default_model().map(str::to_string))
    }

    /// Resolves the API key from config, then from the vendor env var.
    pub fn resolve_api_key(&self) -> Result<String, QuireError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Like [`resolve_api_key`](Self::resolve_api_key) with an injectable
    /// environment lookup.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, QuireError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .or_else(|| lookup(self.kind.api_key_env()))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| QuireError::MissingCredential {
                provider: self.kind.to_string(),
            })
    }
}

fn default_kind() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_probe_timeout_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Memory system configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Whether extraction and retrieval run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Similarity above which two same-day events are merge candidates.
    #[serde(default = "default_episodic_threshold")]
    pub episodic_similarity_threshold: f64,

    /// Similarity above which two patterns are merge candidates.
    #[serde(default = "default_procedural_threshold")]
    pub procedural_similarity_threshold: f64,

    /// Maximum memories injected into a prompt as context.
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Output token budget for extraction calls.
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            episodic_similarity_threshold: default_episodic_threshold(),
            procedural_similarity_threshold: default_procedural_threshold(),
            retrieval_limit: default_retrieval_limit(),
            extraction_max_tokens: default_extraction_max_tokens(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_episodic_threshold() -> f64 {
    0.45
}

fn default_procedural_threshold() -> f64 {
    0.55
}

fn default_retrieval_limit() -> usize {
    10
}

fn default_extraction_max_tokens() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = QuireConfig::default();
        assert_eq!(config.journal.log_level, "info");
        assert_eq!(config.journal.max_fragments, 200);
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.probe_timeout_secs, 15);
        assert_eq!(config.memory.episodic_similarity_threshold, 0.45);
        assert_eq!(config.memory.procedural_similarity_threshold, 0.55);
        assert!(config.memory.enabled);
    }

    #[test]
    fn model_name_falls_back_to_vendor_default() {
        let mut provider = ProviderConfig {
            kind: ProviderKind::Gemini,
            ..Default::default()
        };
        assert_eq!(provider.model_name().as_deref(), Some("gemini-2.0-flash"));

        provider.model = Some("  ".into());
        assert_eq!(provider.model_name().as_deref(), Some("gemini-2.0-flash"));

        provider.model = Some("gemini-2.5-pro".into());
        assert_eq!(provider.model_name().as_deref(), Some("gemini-2.5-pro"));

        let custom = ProviderConfig {
            kind: ProviderKind::Custom,
            ..Default::default()
        };
        assert!(custom.model_name().is_none());
    }

    #[test]
    fn api_key_prefers_config_over_env() {
        let provider = ProviderConfig {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        let key = provider
            .resolve_api_key_with(|_| Some("from-env".into()))
            .unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn api_key_reads_vendor_env_var() {
        let provider = ProviderConfig {
            kind: ProviderKind::DeepSeek,
            ..Default::default()
        };
        let key = provider
            .resolve_api_key_with(|name| (name == "DEEPSEEK_API_KEY").then(|| "sk-ds".into()))
            .unwrap();
        assert_eq!(key, "sk-ds");
    }

    #[test]
    fn blank_api_key_is_missing_credential() {
        let provider = ProviderConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        let err = provider.resolve_api_key_with(|_| None).unwrap_err();
        assert!(matches!(err, QuireError::MissingCredential { provider } if provider == "openai"));
    }

    #[test]
    fn unknown_provider_kind_is_rejected() {
        let result = toml::from_str::<QuireConfig>("[provider]\nkind = \"anthropic\"\n");
        assert!(result.is_err());
    }
}
