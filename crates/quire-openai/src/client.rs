// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for chat-completion compatible APIs.
//!
//! [`ChatClient`] owns authentication headers and the resolved base URL.
//! It never retries: a non-2xx status is returned as
//! [`QuireError::Api`] carrying the raw response body.
//!
//! The request timeout bounds connecting and each idle gap between body
//! reads. Only the non-streaming call is also capped as a whole, so a long
//! generation that keeps sending deltas is never cut off.

use std::time::Duration;

use quire_core::{QuireError, TextStream};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::sse;
use crate::types::{ChatRequest, ChatResponse};

/// HTTP client bound to one base URL and API key.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl ChatClient {
    /// Builds a client sending `Authorization: Bearer <api_key>` on every call.
    pub fn new(
        api_key: &str,
        base_url: String,
        request_timeout: Duration,
    ) -> Result<Self, QuireError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| QuireError::Config(format!("invalid API key header value: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(request_timeout)
            .read_timeout(request_timeout)
            .build()
            .map_err(|e| QuireError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Sends a streaming request and decodes its event stream.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<TextStream, QuireError> {
        let response = self
            .client
            .post(self.completions_url())
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(e, self.request_timeout))?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "streaming response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        Ok(sse::decode_response(response, self.request_timeout))
    }

    /// Sends a non-streaming request and returns `choices[0].message.content`.
    pub async fn complete_chat(&self, request: &ChatRequest) -> Result<String, QuireError> {
        let response = self
            .client
            .post(self.completions_url())
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| send_error(e, self.request_timeout))?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| read_error(e, self.request_timeout))?;
        extract_message_content(&body)
    }

    /// Sends a 1-token request under `timeout`.
    ///
    /// `Ok(false)` means the server rejected the credentials (401/403).
    pub async fn probe(&self, request: &ChatRequest, timeout: Duration) -> Result<bool, QuireError> {
        let response = self
            .client
            .post(self.completions_url())
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| send_error(e, timeout))?;

        let status = response.status();
        debug!(status = %status, "probe response received");
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            s => Err(api_error(s, response).await),
        }
    }
}

/// Locates `choices[0].message.content` in a JSON-mode response body.
pub fn extract_message_content(body: &str) -> Result<String, QuireError> {
    if body.trim().is_empty() {
        return Err(QuireError::EmptyResponse);
    }

    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| QuireError::parse(format!("unexpected chat completion body: {e}")))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| QuireError::parse("response has no choices"))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| QuireError::parse("choices[0].message.content is missing"))?;

    if content.trim().is_empty() {
        return Err(QuireError::EmptyResponse);
    }
    Ok(content)
}

pub(crate) fn send_error(e: reqwest::Error, timeout: Duration) -> QuireError {
    if e.is_timeout() {
        QuireError::Timeout { duration: timeout }
    } else {
        QuireError::transport("HTTP request failed", e)
    }
}

/// Maps a body read failure, keeping timeouts distinct.
pub(crate) fn read_error(e: reqwest::Error, timeout: Duration) -> QuireError {
    if e.is_timeout() {
        QuireError::Timeout { duration: timeout }
    } else {
        QuireError::transport("failed to read response body", e)
    }
}

/// Reads the whole error body; it becomes the error message verbatim.
pub(crate) async fn api_error(status: StatusCode, response: reqwest::Response) -> QuireError {
    let message = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "provider returned an error status");
    QuireError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(extract_message_content(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn missing_fields_are_parse_failures() {
        for body in [
            r#"{"id":"x"}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"index":0}]}"#,
            "<html>bad gateway</html>",
        ] {
            let err = extract_message_content(body).unwrap_err();
            assert!(matches!(err, QuireError::ParseFailure { .. }), "{body}: {err:?}");
        }
    }

    #[test]
    fn blank_body_or_content_is_empty_response() {
        assert!(matches!(
            extract_message_content("  "),
            Err(QuireError::EmptyResponse)
        ));
        assert!(matches!(
            extract_message_content(r#"{"choices":[{"message":{"content":"  \n"}}]}"#),
            Err(QuireError::EmptyResponse)
        ));
    }
}
