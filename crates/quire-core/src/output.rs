// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured-output parsing for non-streaming JSON-mode responses.
//!
//! Provider adapters locate the text payload in their own wire format; the
//! functions here take that payload, strip markdown fences, and decode it
//! into a typed output. Decoding never fails: journal output falls back to
//! a placeholder entry carrying the raw text, extraction output falls back
//! to an empty result.

use tracing::{debug, warn};

use crate::types::{JournalOutput, MemoryExtractionResult};

const FENCE: &str = "```";

pub const FALLBACK_TITLE: &str = "Journal Entry";
pub const FALLBACK_SUMMARY: &str = "Notes from the day.";
pub const FALLBACK_MOOD: &str = "neutral";
pub const FALLBACK_INSIGHT: &str = "No insight was generated for this entry.";

/// Trims the text and removes a surrounding markdown code fence.
///
/// Handles both the multi-line form (fence + language tag on its own line)
/// and the single-line form (```` ```json {...}``` ````).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    let inner = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    inner.strip_suffix(FENCE).unwrap_or(inner).trim()
}

/// Rewrites escaped newline artifacts into real newlines.
///
/// Double-escaped sequences (`\\n`) are handled before single ones (`\n`)
/// so that no stray backslash survives.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\\\\n", "\n").replace("\\n", "\n")
}

/// Decodes a journal entry, synthesizing a fallback on any decode failure.
pub fn parse_journal(text: &str) -> JournalOutput {
    let cleaned = strip_code_fence(text);

    match serde_json::from_str::<JournalOutput>(cleaned) {
        Ok(mut output) => {
            output.summary = normalize_newlines(&output.summary);
            output.body = normalize_newlines(&output.body);
            output.insight = normalize_newlines(&output.insight);
            output.raw_source = Some(cleaned.to_string());
            output
        }
        Err(e) => {
            warn!(error = %e, "journal output is not valid JSON, using fallback entry");
            fallback_journal(cleaned)
        }
    }
}

/// Builds the placeholder entry whose body is the given text, verbatim.
pub fn fallback_journal(body: &str) -> JournalOutput {
    JournalOutput {
        title: FALLBACK_TITLE.to_string(),
        summary: FALLBACK_SUMMARY.to_string(),
        mood: FALLBACK_MOOD.to_string(),
        body: body.to_string(),
        insight: FALLBACK_INSIGHT.to_string(),
        raw_source: Some(body.to_string()),
    }
}

/// Decodes an extraction result; any decode failure yields an empty result.
pub fn parse_extraction(text: &str) -> MemoryExtractionResult {
    let cleaned = strip_code_fence(text);

    match serde_json::from_str::<MemoryExtractionResult>(cleaned) {
        Ok(mut result) => {
            for item in &mut result.semantic {
                item.value = normalize_newlines(&item.value);
            }
            for item in &mut result.episodic {
                item.event = normalize_newlines(&item.event);
                item.context = item.context.as_deref().map(normalize_newlines);
            }
            for item in &mut result.procedural {
                item.preference = normalize_newlines(&item.preference);
            }
            result
        }
        Err(e) => {
            warn!(error = %e, "extraction output is not valid JSON, treating as empty");
            debug!(raw = cleaned, "unparsed extraction output");
            MemoryExtractionResult::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const JOURNAL_JSON: &str = r#"{"title":"Park day","summary":"A calm walk.","mood":"calm","body":"We walked.\\nThen rested.","insight":"Slow days help."}"#;

    #[test]
    fn strip_multiline_fence_with_language_tag() {
        let fenced = format!("```json\n{JOURNAL_JSON}\n```");
        assert_eq!(strip_code_fence(&fenced), JOURNAL_JSON);
    }

    #[test]
    fn strip_single_line_fence() {
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fence("  plain text \n"), "plain text");
    }

    #[test]
    fn fenced_and_unfenced_decode_identically() {
        let fenced = format!("```json\n{JOURNAL_JSON}\n```");
        let mut a = parse_journal(&fenced);
        let mut b = parse_journal(JOURNAL_JSON);
        a.raw_source = None;
        b.raw_source = None;
        assert_eq!(a, b);
        assert_eq!(a.title, "Park day");
    }

    #[test]
    fn escaped_newlines_become_real_newlines() {
        let output = parse_journal(JOURNAL_JSON);
        assert_eq!(output.body, "We walked.\nThen rested.");
    }

    #[test]
    fn normalize_handles_double_escape_first() {
        assert_eq!(normalize_newlines(r"a\\nb"), "a\nb");
        assert_eq!(normalize_newlines(r"a\nb"), "a\nb");
        assert_eq!(normalize_newlines("a\nb"), "a\nb");
    }

    #[test]
    fn content_alias_is_accepted_for_body() {
        let json = r#"{"title":"t","summary":"s","mood":"m","content":"body text","insight":"i"}"#;
        assert_eq!(parse_journal(json).body, "body text");
    }

    #[test]
    fn invalid_journal_json_falls_back_to_raw_text() {
        let output = parse_journal("```markdown\nToday I walked.\n```");
        assert_eq!(output.title, FALLBACK_TITLE);
        assert_eq!(output.mood, FALLBACK_MOOD);
        assert_eq!(output.body, "Today I walked.");
        assert_eq!(output.raw_source.as_deref(), Some("Today I walked."));
    }

    #[test]
    fn partial_journal_json_falls_back() {
        let output = parse_journal(r#"{"title":"only a title"}"#);
        assert_eq!(output.title, FALLBACK_TITLE);
        assert_eq!(output.body, r#"{"title":"only a title"}"#);
    }

    #[test]
    fn extraction_decodes_all_lists() {
        let json = r#"```json
{
  "semantic": [{"key": "pet.name", "value": "Max", "confidence": 0.9}],
  "episodic": [{"event": "Went to the park", "date": "2026-03-01", "emotion": "happy"}],
  "procedural": [{"pattern": "morning coffee", "preference": "black", "trigger": "waking up"}]
}
```"#;
        let result = parse_extraction(json);
        assert_eq!(result.semantic[0].key, "pet.name");
        assert_eq!(result.semantic[0].confidence, 0.9);
        assert_eq!(result.episodic[0].emotion.as_deref(), Some("happy"));
        assert_eq!(result.procedural[0].trigger.as_deref(), Some("waking up"));
    }

    #[test]
    fn extraction_decode_failure_is_empty() {
        assert!(parse_extraction("I could not find anything.").is_empty());
        assert!(parse_extraction("").is_empty());
    }

    proptest! {
        #[test]
        fn fallback_body_equals_cleaned_text(text in "[a-zA-Z0-9 .,!?'\n-]{0,200}") {
            let output = parse_journal(&text);
            prop_assert_eq!(output.body.as_str(), strip_code_fence(&text));
            prop_assert_eq!(output.title.as_str(), FALLBACK_TITLE);
        }

        #[test]
        fn fence_wrapping_does_not_change_decoding(
            title in "[a-zA-Z ]{1,20}",
            body in "[a-zA-Z .]{0,60}",
            tag in "(json|JSON|)",
        ) {
            let json = serde_json::json!({
                "title": title, "summary": "s", "mood": "m", "body": body, "insight": "i"
            })
            .to_string();
            let fenced = format!("```{tag}\n{json}\n```");
            let mut a = parse_journal(&fenced);
            let mut b = parse_journal(&json);
            a.raw_source = None;
            b.raw_source = None;
            prop_assert_eq!(a, b);
        }
    }
}
