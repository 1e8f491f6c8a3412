// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate-content request and response types.

use serde::{Deserialize, Serialize};

/// Body of `POST <base>/models/<model>:{generateContent|streamGenerateContent}`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    pub fn new(system: String, user: String, config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content::text(user)],
            system_instruction: Content::text(system),
            generation_config: config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(text: String) -> Self {
        Self {
            parts: vec![Part { text: Some(text) }],
        }
    }
}

/// One content part. Non-text parts (inline data, function calls) leave
/// `text` empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    /// `application/json` in JSON mode only.
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'static str>,
}

impl GenerationConfig {
    pub fn text(max_output_tokens: u32) -> Self {
        Self {
            max_output_tokens,
            response_mime_type: None,
        }
    }

    pub fn json(max_output_tokens: u32) -> Self {
        Self {
            max_output_tokens,
            response_mime_type: Some("application/json"),
        }
    }
}

/// `{candidates: [{content: {parts: [{text}]}}]}`, used for both the
/// full response and every streamed element.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, if every step is present.
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()?
            .text
    }
}
