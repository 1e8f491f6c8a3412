// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider construction from the `[provider]` section.

use std::sync::Arc;

use quire_config::ProviderConfig;
use quire_core::{CompletionProvider, ProviderFamily, QuireError};
use quire_gemini::GeminiProvider;
use quire_openai::ChatCompletionProvider;

pub fn build(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>, QuireError> {
    let provider: Arc<dyn CompletionProvider> = match config.kind.family() {
        ProviderFamily::ChatCompletion => Arc::new(ChatCompletionProvider::from_config(config)?),
        ProviderFamily::GenerateContent => Arc::new(GeminiProvider::from_config(config)?),
    };
    Ok(provider)
}
