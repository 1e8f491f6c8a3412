// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized edit-distance similarity.

/// Returns `1 - levenshtein(a, b) / max(len(a), len(b))` over chars.
///
/// Two empty strings are identical (1.0). Comparison is on the raw text,
/// callers normalize case themselves if they need to.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}
