// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-delimited `data:` stream decoder for chat-completion responses.
//!
//! The response body is split on `\n` with tokio-util's
//! `AnyDelimiterCodec`. Each line is classified on its own, so a malformed
//! line, including one that is not UTF-8, never affects its neighbours.

use std::future;
use std::io;
use std::time::Duration;

use futures::stream::{Stream, StreamExt, TryStreamExt};
use quire_core::{QuireError, TextStream};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::types::StreamChunk;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// What a single stream line contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// A text delta to hand to the caller.
    Chunk(String),
    /// Nothing to emit: comments, blank keep-alives, other fields, malformed
    /// JSON, or a chunk without `delta.content`.
    Skip,
    /// The `[DONE]` terminator.
    Done,
}

/// Classifies one line of the event stream.
pub fn decode_line(line: &str) -> LineOutcome {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Skip;
    };
    let payload = payload.trim();
    if payload == DONE_MARKER {
        return LineOutcome::Done;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .into_content()
            .map_or(LineOutcome::Skip, LineOutcome::Chunk),
        Err(e) => {
            debug!(error = %e, "skipping malformed stream line");
            LineOutcome::Skip
        }
    }
}

/// Decodes a stream of lines into text chunks, stopping at `[DONE]`.
///
/// Reaching the end of the input without `[DONE]` is a normal completion.
/// Transport errors are forwarded unchanged.
pub fn decode_line_stream<S>(lines: S) -> TextStream
where
    S: Stream<Item = Result<String, QuireError>> + Send + 'static,
{
    let decoded = lines
        .map(|line| line.map(|l| decode_line(&l)))
        .take_while(|outcome| future::ready(!matches!(outcome, Ok(LineOutcome::Done))))
        .filter_map(|outcome| {
            future::ready(match outcome {
                Ok(LineOutcome::Chunk(text)) => Some(Ok(text)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
        });

    Box::pin(decoded)
}

/// Decodes a successful streaming HTTP response.
///
/// Dropping the returned stream drops the response body and aborts the read.
/// A read that stalls past `idle_timeout` ends the stream with
/// [`QuireError::Timeout`].
pub fn decode_response(response: reqwest::Response, idle_timeout: Duration) -> TextStream {
    let body = response.bytes_stream().map_err(io::Error::other);
    let codec = AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new());
    let lines = FramedRead::new(StreamReader::new(body), codec)
        .map_err(move |e| read_error(e, idle_timeout))
        .try_filter_map(|frame| future::ready(Ok(utf8_line(&frame))));

    decode_line_stream(lines)
}

/// One raw line as text, without a trailing `\r`. `None` if not UTF-8.
fn utf8_line(frame: &[u8]) -> Option<String> {
    match std::str::from_utf8(frame) {
        Ok(line) => Some(line.strip_suffix('\r').unwrap_or(line).to_string()),
        Err(e) => {
            debug!(error = %e, "skipping stream line that is not UTF-8");
            None
        }
    }
}

fn read_error(e: AnyDelimiterCodecError, idle_timeout: Duration) -> QuireError {
    let timed_out = match &e {
        AnyDelimiterCodecError::Io(err) => err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout),
        _ => false,
    };
    if timed_out {
        QuireError::Timeout {
            duration: idle_timeout,
        }
    } else {
        QuireError::transport("failed to read event stream", e)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use futures::stream;
    use proptest::prelude::*;

    use super::*;

    fn collect(lines: Vec<String>) -> Vec<String> {
        let input = stream::iter(lines.into_iter().map(Ok));
        block_on(decode_line_stream(input).try_collect::<Vec<_>>()).unwrap()
    }

    fn data_line(content: &str) -> String {
        let chunk = serde_json::json!({"choices": [{"delta": {"content": content}}]});
        format!("data: {chunk}")
    }

    #[test]
    fn hello_world_then_done() {
        let lines = vec![
            r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#.to_string(),
            r#"data: {"choices":[{"delta":{"content":" world"}}]}"#.to_string(),
            "data: [DONE]".to_string(),
        ];
        assert_eq!(collect(lines), vec!["Hello", " world"]);
    }

    #[test]
    fn lines_after_done_are_ignored() {
        let lines = vec![data_line("a"), "data: [DONE]".into(), data_line("b")];
        assert_eq!(collect(lines), vec!["a"]);
    }

    #[test]
    fn end_without_done_is_normal() {
        assert_eq!(collect(vec![data_line("x"), data_line("y")]), vec!["x", "y"]);
    }

    #[test]
    fn malformed_line_is_skipped() {
        let lines = vec![
            data_line("before"),
            "data: {not json".into(),
            data_line("after"),
        ];
        assert_eq!(collect(lines), vec!["before", "after"]);
    }

    #[test]
    fn invalid_utf8_line_is_dropped() {
        assert_eq!(utf8_line(b"data: \xff\xfe"), None);
        assert_eq!(utf8_line(b"data: [DONE]\r").as_deref(), Some("data: [DONE]"));
    }

    #[test]
    fn io_failure_other_than_timeout_is_transport() {
        let err = read_error(
            AnyDelimiterCodecError::Io(io::Error::other("connection reset")),
            Duration::from_secs(1),
        );
        assert!(matches!(err, QuireError::Transport { .. }), "{err:?}");
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert_eq!(decode_line(""), LineOutcome::Skip);
        assert_eq!(decode_line(": keep-alive"), LineOutcome::Skip);
        assert_eq!(decode_line("event: message"), LineOutcome::Skip);
        assert_eq!(decode_line("data:[DONE]"), LineOutcome::Skip);
        assert_eq!(decode_line("data: [DONE]  "), LineOutcome::Done);
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(decode_line(line), LineOutcome::Skip);
    }

    #[test]
    fn transport_error_is_forwarded() {
        let input = stream::iter(vec![
            Ok(data_line("partial")),
            Err(QuireError::transport("reset", io::Error::other("connection reset"))),
        ]);
        let items: Vec<_> = block_on(decode_line_stream(input).collect::<Vec<_>>());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(QuireError::Transport { .. })));
    }

    #[derive(Debug, Clone)]
    enum Line {
        Content(String),
        Malformed(String),
        Noise(String),
    }

    fn line_strategy() -> impl Strategy<Value = Line> {
        prop_oneof![
            any::<String>().prop_map(Line::Content),
            "[a-z{}\\[\\]:,\" ]{0,20}".prop_map(Line::Malformed),
            "(: ping|event: x|id: 1|)".prop_map(Line::Noise),
        ]
    }

    proptest! {
        #[test]
        fn output_is_concatenation_of_well_formed_deltas(
            lines in proptest::collection::vec(line_strategy(), 0..30),
            terminate in any::<bool>(),
        ) {
            let mut expected = String::new();
            let mut raw = Vec::new();
            for line in &lines {
                match line {
                    Line::Content(text) => {
                        expected.push_str(text);
                        raw.push(data_line(text));
                    }
                    Line::Malformed(junk) => {
                        // Prefix with `{{` so the payload can never be valid JSON.
                        raw.push(format!("data: {{{{{junk}"));
                    }
                    Line::Noise(noise) => raw.push(noise.clone()),
                }
            }
            if terminate {
                raw.push("data: [DONE]".into());
                raw.push(data_line("ignored"));
            }

            let chunks = collect(raw);
            prop_assert_eq!(chunks.concat(), expected);
        }
    }
}
