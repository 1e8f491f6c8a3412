// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the generate-content API.
//!
//! The API key travels as a `key` query parameter, so URLs are never
//! logged and reqwest errors are stripped of their URL before wrapping.
//!
//! The request timeout bounds connecting and each idle gap between body
//! reads; `generateContent` is also capped as a whole, the streaming call
//! is not.

use std::time::Duration;

use quire_core::{QuireError, TextStream};
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::stream;
use crate::types::{GenerateRequest, GenerateResponse};

/// Generate-content method names appended to the model path.
const STREAM_METHOD: &str = "streamGenerateContent";
const GENERATE_METHOD: &str = "generateContent";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        request_timeout: Duration,
    ) -> Result<Self, QuireError> {
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .read_timeout(request_timeout)
            .build()
            .map_err(|e| QuireError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<path>?key=<api_key>`.
    fn url(&self, path: &str) -> Result<Url, QuireError> {
        let raw = format!("{}/{path}", self.base_url);
        Url::parse_with_params(&raw, &[("key", self.api_key.as_str())]).map_err(|e| {
            QuireError::InvalidEndpoint {
                endpoint: self.base_url.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn model_url(&self, model: &str, method: &str) -> Result<Url, QuireError> {
        self.url(&format!("models/{model}:{method}"))
    }

    /// Streams `:streamGenerateContent` and decodes the object stream.
    pub async fn stream_generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<TextStream, QuireError> {
        let response = self
            .client
            .post(self.model_url(model, STREAM_METHOD)?)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(e, self.request_timeout))?;

        let status = response.status();
        debug!(status = %status, model, method = STREAM_METHOD, "streaming response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(stream::decode_response(response, self.request_timeout))
    }

    /// Calls `:generateContent` and returns the first candidate's text.
    pub async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, QuireError> {
        let response = self
            .client
            .post(self.model_url(model, GENERATE_METHOD)?)
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| send_error(e, self.request_timeout))?;

        let status = response.status();
        debug!(status = %status, model, method = GENERATE_METHOD, "completion response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| read_error(e, self.request_timeout, "failed to read response body"))?;
        extract_candidate_text(&body)
    }

    /// Lists models under `timeout`; spends no generation tokens.
    ///
    /// `Ok(false)` means the key was rejected.
    pub async fn probe(&self, timeout: Duration) -> Result<bool, QuireError> {
        let response = self
            .client
            .get(self.url("models")?)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| send_error(e, timeout))?;

        let status = response.status();
        debug!(status = %status, "probe response received");
        if status.is_success() {
            return Ok(true);
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(false);
        }
        match api_error(status, response).await {
            QuireError::Api { status: 400, message } if message.contains("API_KEY_INVALID") => {
                Ok(false)
            }
            other => Err(other),
        }
    }
}

/// Locates `candidates[0].content.parts[0].text` in a full response body.
pub fn extract_candidate_text(body: &str) -> Result<String, QuireError> {
    if body.trim().is_empty() {
        return Err(QuireError::EmptyResponse);
    }

    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| QuireError::parse(format!("unexpected generate-content body: {e}")))?;
    let text = response
        .first_text()
        .ok_or_else(|| QuireError::parse("candidates[0].content.parts[0].text is missing"))?;

    if text.trim().is_empty() {
        return Err(QuireError::EmptyResponse);
    }
    Ok(text)
}

fn send_error(e: reqwest::Error, timeout: Duration) -> QuireError {
    if e.is_timeout() {
        QuireError::Timeout { duration: timeout }
    } else {
        QuireError::transport("HTTP request failed", e.without_url())
    }
}

/// Maps a body read failure, keeping timeouts distinct.
pub(crate) fn read_error(e: reqwest::Error, timeout: Duration, message: &str) -> QuireError {
    if e.is_timeout() {
        QuireError::Timeout { duration: timeout }
    } else {
        QuireError::transport(message, e.without_url())
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> QuireError {
    QuireError::Api {
        status: status.as_u16(),
        message: response.text().await.unwrap_or_default(),
    }
}
