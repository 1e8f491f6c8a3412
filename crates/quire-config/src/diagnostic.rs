// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns Figment extraction errors into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint picked by Jaro-Winkler similarity
//! and, when the offending file is known, a labelled source span.

#![allow(unused_assignments)] // miette's Diagnostic derive triggers this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use quire_core::QuireError;
use thiserror::Error;

/// Minimum Jaro-Winkler score for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem ready to be rendered by miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section recognizes.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(quire::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted at this position.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type, e.g. a string where a number belongs.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(quire::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// An enum value outside the accepted set, e.g. an unknown provider kind.
    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(quire::config::invalid_value))]
    InvalidValue { key: String, detail: String },

    /// A required key is absent.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(quire::config::missing_key),
        help("add `{key} = <value>` to quire.toml")
    )]
    MissingKey { key: String },

    /// A semantic check after deserialization failed.
    #[error("validation error: {message}")]
    #[diagnostic(code(quire::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(quire::config::other))]
    Other(String),
}

impl From<ConfigError> for QuireError {
    fn from(err: ConfigError) -> Self {
        QuireError::Config(err.to_string())
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Converts every error inside a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to locate spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let key = dotted_path(&error);
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.to_string(),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key,
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                Kind::UnknownVariant(variant, expected) => ConfigError::InvalidValue {
                    key,
                    detail: format!(
                        "`{variant}` is not one of: {}",
                        expected.join(", ")
                    ),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted_path(error: &figment::Error) -> String {
    error.path.join(".")
}

/// Finds the span of `field` in the file the error originated from.
fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .map(|source| match source {
            figment::Source::File(path) => path.display().to_string(),
            _ => "<inline>".to_string(),
        });

    let Some((path, content)) = origin
        .and_then(|origin| toml_sources.iter().find(|(path, _)| *path == origin))
    else {
        return (None, None);
    };

    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` at the start of a line inside the section named
/// by the first element of `path`, or from the top when `path` is empty.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match for `unknown` above the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
