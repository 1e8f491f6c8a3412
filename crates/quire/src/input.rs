// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fragments from command-line arguments or stdin.

use std::io::BufRead;

use chrono::Utc;
use quire_core::{Fragment, QuireError};

/// One fragment per argument, or per non-blank stdin line when there are
/// no arguments.
pub fn fragments(args: Vec<String>) -> Result<Vec<Fragment>, QuireError> {
    let lines = if args.is_empty() {
        read_lines(std::io::stdin().lock())?
    } else {
        args
    };
    Ok(from_lines(lines, Utc::now().timestamp_millis()))
}

fn read_lines(reader: impl BufRead) -> Result<Vec<String>, QuireError> {
    reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QuireError::transport("failed to read stdin", e))
}

/// Consecutive millisecond timestamps keep the input order.
fn from_lines(lines: Vec<String>, now_ms: i64) -> Vec<Fragment> {
    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            Fragment::text(
                uuid::Uuid::new_v4().to_string(),
                line.trim(),
                now_ms + i as i64,
            )
        })
        .collect()
}
