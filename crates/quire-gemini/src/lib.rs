// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini generate-content provider adapter for Quire.
//!
//! Streaming uses `:streamGenerateContent`, whose body is a JSON array
//! delivered incrementally and decoded by [`stream::ObjectStreamDecoder`].
//! JSON mode uses `:generateContent` with `responseMimeType` set.

pub mod client;
pub mod stream;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use quire_config::ProviderConfig;
use quire_core::traits::{CompletionProvider, PluginAdapter};
use quire_core::types::{CompletionRequest, HealthStatus, ProviderFamily, ProviderKind};
use quire_core::{QuireError, TextStream};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{GenerateRequest, GenerationConfig};

/// Gemini provider implementing [`CompletionProvider`].
pub struct GeminiProvider {
    client: GeminiClient,
    model: String,
    probe_timeout: Duration,
}

impl GeminiProvider {
    /// Validates the key and endpoint, then builds the HTTP client.
    pub fn new(
        api_key: String,
        model: String,
        endpoint: Option<&str>,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, QuireError> {
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(QuireError::MissingCredential {
                provider: ProviderKind::Gemini.to_string(),
            });
        }
        if model.trim().is_empty() {
            return Err(QuireError::Config("no model configured for provider `gemini`".into()));
        }

        let base_url = ProviderKind::Gemini.resolve_base_url(endpoint)?;
        let client = GeminiClient::new(api_key, base_url, request_timeout)?;

        info!(model = %model, base_url = client.base_url(), "gemini provider initialized");

        Ok(Self {
            client,
            model,
            probe_timeout,
        })
    }

    /// Builds a provider from the `[provider]` config section.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, QuireError> {
        if config.kind != ProviderKind::Gemini {
            return Err(QuireError::Config(format!(
                "provider `{}` does not speak the generate-content protocol",
                config.kind
            )));
        }
        Self::new(
            config.resolve_api_key()?,
            config.model_name().unwrap_or_default(),
            config.endpoint.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.probe_timeout_secs),
        )
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, QuireError> {
        Ok(match self.probe().await {
            Ok(true) => HealthStatus::Healthy,
            Ok(false) => HealthStatus::Unhealthy("API key rejected".into()),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GenerateContent
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, QuireError> {
        let body = GenerateRequest::new(
            request.system_prompt,
            request.user_prompt,
            GenerationConfig::text(request.max_tokens),
        );
        self.client.stream_generate(&self.model, &body).await
    }

    async fn complete_json(&self, request: CompletionRequest) -> Result<String, QuireError> {
        let body = GenerateRequest::new(
            request.system_prompt,
            request.user_prompt,
            GenerationConfig::json(request.max_tokens),
        );
        let text = self.client.generate(&self.model, &body).await?;
        debug!(bytes = text.len(), "json completion received");
        Ok(text)
    }

    async fn probe(&self) -> Result<bool, QuireError> {
        self.client.probe(self.probe_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_fails_before_any_request() {
        let err = GeminiProvider::new(
            " ".into(),
            "gemini-2.0-flash".into(),
            None,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, QuireError::MissingCredential { provider } if provider == "gemini"));
    }

    #[test]
    fn bad_endpoint_fails_before_any_request() {
        let err = GeminiProvider::new(
            "k".into(),
            "gemini-2.0-flash".into(),
            Some("generativelanguage.googleapis.com"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, QuireError::InvalidEndpoint { .. }));
    }

    #[test]
    fn from_config_rejects_chat_kinds() {
        let config = ProviderConfig {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert!(matches!(
            GeminiProvider::from_config(&config),
            Err(QuireError::Config(_))
        ));
    }
}
