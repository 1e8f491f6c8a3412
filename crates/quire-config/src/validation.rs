// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Checks constraints serde attributes cannot express. All problems are
//! collected so the user sees every error in one run.

use quire_core::ProviderKind;

use crate::diagnostic::ConfigError;
use crate::model::QuireConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration.
pub fn validate_config(config: &QuireConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let level = config.journal.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "journal.log_level `{}` must be one of: {}",
            config.journal.log_level,
            LOG_LEVELS.join(", ")
        ));
    }
    if config.journal.max_fragments == 0 {
        fail("journal.max_fragments must be at least 1".to_string());
    }
    if config.journal.language.trim().is_empty() {
        fail("journal.language must not be empty".to_string());
    }

    let provider = &config.provider;
    if provider.max_tokens == 0 {
        fail("provider.max_tokens must be greater than 0".to_string());
    }
    if provider.probe_timeout_secs == 0 {
        fail("provider.probe_timeout_secs must be greater than 0".to_string());
    }
    if provider.request_timeout_secs == 0 {
        fail("provider.request_timeout_secs must be greater than 0".to_string());
    }

    let has_endpoint = provider
        .endpoint
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty());
    if provider.kind == ProviderKind::Custom && !has_endpoint {
        fail("provider.endpoint is required when provider.kind = \"custom\"".to_string());
    } else if let Err(e) = provider.kind.resolve_base_url(provider.endpoint.as_deref()) {
        fail(format!("provider.endpoint: {e}"));
    }
    if provider.model_name().is_none() {
        fail(format!(
            "provider.model is required when provider.kind = \"{}\"",
            provider.kind
        ));
    }

    let memory = &config.memory;
    for (name, value) in [
        (
            "memory.episodic_similarity_threshold",
            memory.episodic_similarity_threshold,
        ),
        (
            "memory.procedural_similarity_threshold",
            memory.procedural_similarity_threshold,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            fail(format!("{name} must be within [0, 1], got {value}"));
        }
    }
    if memory.extraction_max_tokens == 0 {
        fail("memory.extraction_max_tokens must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
