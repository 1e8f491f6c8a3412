// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concatenated-object stream decoder for generate-content responses.
//!
//! The streaming endpoint returns one JSON array whose elements arrive
//! incrementally. Array punctuation is unreliable as a delimiter once an
//! element holds nested braces or braces inside strings, so elements are
//! recovered by counting braces outside string literals.

use std::future;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use quire_core::{QuireError, TextStream};
use tracing::debug;

use crate::client::read_error;
use crate::types::GenerateResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// Between objects; everything except `{` is ignored.
    #[default]
    Idle,
    /// Inside an object, counting braces.
    InObject,
    /// Inside a string literal; braces are content.
    InString,
    /// Right after a backslash inside a string.
    Escaped,
}

/// Incremental splitter yielding the raw bytes of each complete top-level
/// JSON object.
///
/// Operates on bytes: every structural character is ASCII, and UTF-8
/// continuation bytes never collide with them, so a multi-byte character
/// split across two reads is reassembled in the buffer untouched.
#[derive(Debug, Default)]
pub struct ObjectStreamDecoder {
    state: State,
    depth: usize,
    buffer: Vec<u8>,
}

impl ObjectStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next read and returns every object it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut complete = Vec::new();

        for &byte in bytes {
            match self.state {
                State::Idle => {
                    if byte == b'{' {
                        self.state = State::InObject;
                        self.depth = 1;
                        self.buffer.clear();
                        self.buffer.push(byte);
                    }
                }
                State::InObject => {
                    self.buffer.push(byte);
                    match byte {
                        b'"' => self.state = State::InString,
                        b'{' => self.depth += 1,
                        b'}' => {
                            self.depth -= 1;
                            if self.depth == 0 {
                                complete.push(std::mem::take(&mut self.buffer));
                                self.state = State::Idle;
                            }
                        }
                        _ => {}
                    }
                }
                State::InString => {
                    self.buffer.push(byte);
                    match byte {
                        b'\\' => self.state = State::Escaped,
                        b'"' => self.state = State::InObject,
                        _ => {}
                    }
                }
                State::Escaped => {
                    self.buffer.push(byte);
                    self.state = State::InString;
                }
            }
        }

        complete
    }

    /// True while an object has started but not yet closed.
    pub fn has_partial(&self) -> bool {
        self.state != State::Idle
    }
}

/// Extracts `candidates[0].content.parts[0].text` from one streamed object.
///
/// Unparsable elements and elements without text yield `None`.
pub fn object_text(object: &[u8]) -> Option<String> {
    match serde_json::from_slice::<GenerateResponse>(object) {
        Ok(response) => response.first_text(),
        Err(e) => {
            debug!(error = %e, bytes = object.len(), "skipping unparsable stream element");
            None
        }
    }
}

/// Decodes a stream of byte reads into text chunks, one per object.
///
/// An object still open when the input ends is dropped silently.
pub fn decode_byte_stream<S, B>(reads: S) -> TextStream
where
    S: Stream<Item = Result<B, QuireError>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
{
    let decoded = reads
        .scan(ObjectStreamDecoder::new(), |decoder, read| {
            let items: Vec<Result<String, QuireError>> = match read {
                Ok(bytes) => decoder
                    .push(bytes.as_ref())
                    .iter()
                    .filter_map(|object| object_text(object))
                    .map(Ok)
                    .collect(),
                Err(e) => vec![Err(e)],
            };
            future::ready(Some(stream::iter(items)))
        })
        .flatten();

    Box::pin(decoded)
}

/// Decodes a successful streaming HTTP response.
///
/// A read that stalls past `idle_timeout` ends the stream with
/// [`QuireError::Timeout`].
pub fn decode_response(response: reqwest::Response, idle_timeout: Duration) -> TextStream {
    decode_byte_stream(
        response
            .bytes_stream()
            .map_err(move |e| read_error(e, idle_timeout, "failed to read response stream")),
    )
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use proptest::prelude::*;

    use super::*;

    fn element(text: &str) -> String {
        serde_json::json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
            .to_string()
    }

    fn decode_reads(reads: Vec<Vec<u8>>) -> Vec<String> {
        let input = stream::iter(reads.into_iter().map(Ok::<_, QuireError>));
        block_on(decode_byte_stream(input).try_collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn two_elements_in_one_array() {
        let body = r#"[{"candidates":[{"content":{"parts":[{"text":"A"}]}}]},{"candidates":[{"content":{"parts":[{"text":"B"}]}}]}]"#;
        assert_eq!(decode_reads(vec![body.as_bytes().to_vec()]), vec!["A", "B"]);
    }

    #[test]
    fn braces_and_quotes_inside_strings_do_not_split() {
        let tricky = r#"he said "{not}" and \ then }}{{"#;
        let body = format!("[{},\r\n{}]", element(tricky), element("next"));
        assert_eq!(decode_reads(vec![body.into_bytes()]), vec![tricky, "next"]);
    }

    #[test]
    fn object_split_across_reads_byte_by_byte() {
        let body = format!("[{}\n,{}]", element("ünïcödé 🎉"), element("x"));
        let reads = body.bytes().map(|b| vec![b]).collect();
        assert_eq!(decode_reads(reads), vec!["ünïcödé 🎉", "x"]);
    }

    #[test]
    fn incomplete_trailing_object_is_discarded() {
        let body = format!("[{},{{\"candidates\":[{{\"content\"", element("done"));
        assert_eq!(decode_reads(vec![body.into_bytes()]), vec!["done"]);

        let mut decoder = ObjectStreamDecoder::new();
        decoder.push(b"[{\"a\":");
        assert!(decoder.has_partial());
    }

    #[test]
    fn element_without_text_is_skipped() {
        let body = format!(
            "[{{\"candidates\":[{{\"finishReason\":\"SAFETY\"}}]}},{{\"usageMetadata\":{{}}}},{}]",
            element("kept")
        );
        assert_eq!(decode_reads(vec![body.into_bytes()]), vec!["kept"]);
    }

    #[test]
    fn empty_text_is_still_emitted() {
        assert_eq!(decode_reads(vec![element("").into_bytes()]), vec![""]);
    }

    #[test]
    fn read_error_is_forwarded() {
        let input = stream::iter(vec![
            Ok(element("a").into_bytes()),
            Err(QuireError::Internal("boom".into())),
        ]);
        let items: Vec<_> = block_on(decode_byte_stream(input).collect::<Vec<_>>());
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    proptest! {
        #[test]
        fn one_chunk_per_object_regardless_of_splits(
            texts in proptest::collection::vec(any::<String>(), 0..8),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
            pretty in any::<bool>(),
        ) {
            let separator = if pretty { ",\n  " } else { "," };
            let body = format!(
                "[{}]",
                texts.iter().map(|t| element(t)).collect::<Vec<_>>().join(separator)
            );
            let bytes = body.into_bytes();

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            points.sort_unstable();
            points.dedup();
            let mut reads = Vec::new();
            let mut start = 0;
            for point in points {
                reads.push(bytes[start..point].to_vec());
                start = point;
            }
            reads.push(bytes[start..].to_vec());

            prop_assert_eq!(decode_reads(reads), texts);
        }
    }
}
