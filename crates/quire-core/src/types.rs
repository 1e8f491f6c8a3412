// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the provider adapters, prompt assembly and the
//! memory system.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QuireError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

// --- Fragments ---

/// Whether a fragment carries text or points at an image attachment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FragmentKind {
    Text,
    Image,
}

/// One atomic user-authored input unit.
///
/// Owned by the caller; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    pub content: String,
    /// Reference to a binary attachment (image path or blob key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub kind: FragmentKind,
    /// Set when the text was edited by hand after capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at_ms: Option<i64>,
}

impl Fragment {
    /// Creates a text fragment.
    pub fn text(id: impl Into<String>, content: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            attachment: None,
            timestamp_ms,
            kind: FragmentKind::Text,
            edited_at_ms: None,
        }
    }

    /// Creates an image fragment with an optional caption.
    pub fn image(
        id: impl Into<String>,
        attachment: impl Into<String>,
        caption: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            id: id.into(),
            content: caption.into(),
            attachment: Some(attachment.into()),
            timestamp_ms,
            kind: FragmentKind::Image,
            edited_at_ms: None,
        }
    }

    /// Applies a manual text edit, stamping the edit time.
    pub fn edit(&mut self, content: impl Into<String>, edited_at_ms: i64) {
        self.content = content.into();
        self.edited_at_ms = Some(edited_at_ms);
    }
}

// --- Structured outputs ---

/// A fully populated journal entry produced from a batch of fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalOutput {
    pub title: String,
    /// One-line summary.
    pub summary: String,
    /// Short mood token, e.g. "calm" or "restless".
    pub mood: String,
    /// Markdown body.
    #[serde(alias = "content")]
    pub body: String,
    /// Reflective commentary on the day.
    pub insight: String,
    /// Raw cleaned model output, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_source: Option<String>,
}

/// A durable fact candidate, e.g. `{key: "pet.name", value: "Max"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticItem {
    pub key: String,
    pub value: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

/// A dated event candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicItem {
    pub event: String,
    /// ISO-ish date string; replaced by the entry date when unusable.
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A behavioral pattern candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralItem {
    pub pattern: String,
    pub preference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
}

/// Output of one memory extraction call. Never persisted itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryExtractionResult {
    #[serde(default)]
    pub semantic: Vec<SemanticItem>,
    #[serde(default)]
    pub episodic: Vec<EpisodicItem>,
    #[serde(default)]
    pub procedural: Vec<ProceduralItem>,
}

impl MemoryExtractionResult {
    /// True when all three lists are empty.
    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.episodic.is_empty() && self.procedural.is_empty()
    }
}

// --- Providers ---

/// Wire protocol family of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProviderFamily {
    /// `POST <base>/chat/completions`, SSE streaming.
    ChatCompletion,
    /// `POST <base>/models/<model>:generateContent`, concatenated-object streaming.
    GenerateContent,
}

/// Concrete LLM vendor selected in configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    OpenRouter,
    /// Any chat-completion compatible server; requires an explicit endpoint.
    Custom,
    Gemini,
}

impl ProviderKind {
    /// The wire protocol family this vendor speaks.
    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderKind::Gemini => ProviderFamily::GenerateContent,
            _ => ProviderFamily::ChatCompletion,
        }
    }

    /// Built-in base URL, `None` for [`ProviderKind::Custom`].
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::DeepSeek => Some("https://api.deepseek.com/v1"),
            ProviderKind::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ProviderKind::Custom => None,
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
        }
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("gpt-4o-mini"),
            ProviderKind::DeepSeek => Some("deepseek-chat"),
            ProviderKind::OpenRouter => Some("openai/gpt-4o-mini"),
            ProviderKind::Custom => None,
            ProviderKind::Gemini => Some("gemini-2.0-flash"),
        }
    }

    /// Environment variable consulted when the config has no API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Custom => "QUIRE_CUSTOM_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Resolves the base URL, preferring a custom endpoint when given.
    ///
    /// Trailing slashes are trimmed. Fails with [`QuireError::InvalidEndpoint`]
    /// when the endpoint is not an absolute http(s) URL or when a custom
    /// provider has no endpoint at all.
    pub fn resolve_base_url(&self, custom: Option<&str>) -> Result<String, QuireError> {
        let candidate = match custom.map(str::trim).filter(|s| !s.is_empty()) {
            Some(endpoint) => endpoint,
            None => self.default_base_url().ok_or_else(|| QuireError::InvalidEndpoint {
                endpoint: String::new(),
                reason: format!("provider `{self}` requires an explicit endpoint"),
            })?,
        };

        validate_base_url(candidate)?;
        Ok(candidate.trim_end_matches('/').to_string())
    }
}

fn validate_base_url(endpoint: &str) -> Result<(), QuireError> {
    let invalid = |reason: &str| QuireError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .ok_or_else(|| invalid("endpoint must start with http:// or https://"))?;

    let host = rest.split('/').next().unwrap_or_default();
    if host.is_empty() {
        return Err(invalid("endpoint has no host"));
    }
    if endpoint.chars().any(char::is_whitespace) {
        return Err(invalid("endpoint contains whitespace"));
    }
    if endpoint.contains('?') || endpoint.contains('#') {
        return Err(invalid("endpoint must not carry a query or fragment"));
    }
    Ok(())
}

/// A prompt pair ready to be sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens,
        }
    }
}
