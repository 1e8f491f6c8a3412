// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completion provider adapter for Quire.
//!
//! Speaks the `POST <base>/chat/completions` protocol used by OpenAI,
//! DeepSeek, OpenRouter and self-hosted compatible servers. Streaming
//! responses are decoded from `data:` lines; JSON mode sets
//! `response_format` and reads `choices[0].message.content`.

pub mod client;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use quire_config::ProviderConfig;
use quire_core::traits::{CompletionProvider, PluginAdapter};
use quire_core::types::{CompletionRequest, HealthStatus, ProviderFamily, ProviderKind};
use quire_core::{QuireError, TextStream};
use tracing::{debug, info};

use crate::client::ChatClient;
use crate::types::{ChatMessage, ChatRequest, ResponseFormat};

/// Connection settings for a [`ChatCompletionProvider`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub api_key: String,
    /// Custom base URL; `None` uses the vendor default.
    pub endpoint: Option<String>,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

/// Chat-completion family provider implementing [`CompletionProvider`].
pub struct ChatCompletionProvider {
    client: ChatClient,
    kind: ProviderKind,
    model: String,
    probe_timeout: Duration,
}

impl ChatCompletionProvider {
    /// Validates credentials and endpoint, then builds the HTTP client.
    ///
    /// Fails with [`QuireError::MissingCredential`] or
    /// [`QuireError::InvalidEndpoint`] without touching the network.
    pub fn new(settings: ChatSettings) -> Result<Self, QuireError> {
        if settings.kind.family() != ProviderFamily::ChatCompletion {
            return Err(QuireError::Config(format!(
                "provider `{}` does not speak the chat-completion protocol",
                settings.kind
            )));
        }
        if settings.api_key.trim().is_empty() {
            return Err(QuireError::MissingCredential {
                provider: settings.kind.to_string(),
            });
        }
        if settings.model.trim().is_empty() {
            return Err(QuireError::Config(format!(
                "no model configured for provider `{}`",
                settings.kind
            )));
        }

        let base_url = settings.kind.resolve_base_url(settings.endpoint.as_deref())?;
        let client = ChatClient::new(settings.api_key.trim(), base_url, settings.request_timeout)?;

        info!(
            provider = %settings.kind,
            model = %settings.model,
            base_url = client.base_url(),
            "chat-completion provider initialized"
        );

        Ok(Self {
            client,
            kind: settings.kind,
            model: settings.model,
            probe_timeout: settings.probe_timeout,
        })
    }

    /// Builds a provider from the `[provider]` config section.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, QuireError> {
        let api_key = config.resolve_api_key()?;
        Self::new(ChatSettings {
            kind: config.kind,
            model: config.model_name().unwrap_or_default(),
            api_key,
            endpoint: config.endpoint.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    fn to_chat_request(&self, request: CompletionRequest, json_mode: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(request.system_prompt),
                ChatMessage::user(request.user_prompt),
            ],
            stream: !json_mode,
            max_tokens: request.max_tokens,
            response_format: json_mode.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl PluginAdapter for ChatCompletionProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenRouter => "openrouter",
            _ => "custom",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        Ok(match self.probe().await {
            Ok(true) => HealthStatus::Healthy,
            Ok(false) => HealthStatus::Unhealthy("credentials rejected".into()),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::ChatCompletion
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, QuireError> {
        let chat = self.to_chat_request(request, false);
        self.client.stream_chat(&chat).await
    }

    async fn complete_json(&self, request: CompletionRequest) -> Result<String, QuireError> {
        let chat = self.to_chat_request(request, true);
        let content = self.client.complete_chat(&chat).await?;
        debug!(provider = self.name(), bytes = content.len(), "json completion received");
        Ok(content)
    }

    async fn probe(&self) -> Result<bool, QuireError> {
        let ping = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user("ping")],
            stream: false,
            max_tokens: 1,
            response_format: None,
        };
        self.client.probe(&ping, self.probe_timeout).await
    }
}
