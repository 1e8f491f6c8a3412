// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of fragments into the user prompt.

use chrono::{DateTime, FixedOffset};
use quire_core::{Fragment, FragmentKind};

pub(crate) const IMAGE_PLACEHOLDER: &str = "[image]";

/// Sorts by timestamp and keeps the newest `limit` fragments, at least one.
pub(crate) fn select(fragments: &[Fragment], limit: usize) -> Vec<&Fragment> {
    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by_key(|f| f.timestamp_ms);
    let skip = ordered.len().saturating_sub(limit.max(1));
    ordered.split_off(skip)
}

fn local_time(timestamp_ms: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|t| t.with_timezone(&offset))
}

/// `YYYY-MM-DD` of a timestamp, used as the entry date.
pub(crate) fn date_of(timestamp_ms: i64, offset: FixedOffset) -> Option<String> {
    local_time(timestamp_ms, offset).map(|t| t.format("%Y-%m-%d").to_string())
}

/// One line per fragment: `HH:MM text`, images as `HH:MM [image] caption`.
pub(crate) fn render(fragments: &[&Fragment], offset: FixedOffset) -> String {
    fragments
        .iter()
        .map(|fragment| {
            let time = local_time(fragment.timestamp_ms, offset)
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string());
            let content = fragment.content.trim();
            match fragment.kind {
                FragmentKind::Text => format!("{time} {content}"),
                FragmentKind::Image if content.is_empty() => format!("{time} {IMAGE_PLACEHOLDER}"),
                FragmentKind::Image => format!("{time} {IMAGE_PLACEHOLDER} {content}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-03-01T08:05:00Z
    const MORNING: i64 = 1_772_352_300_000;

    #[test]
    fn select_orders_and_keeps_newest() {
        let fragments = vec![
            Fragment::text("c", "third", MORNING + 120_000),
            Fragment::text("a", "first", MORNING),
            Fragment::text("b", "second", MORNING + 60_000),
        ];
        let picked: Vec<&str> = select(&fragments, 2).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(picked, vec!["b", "c"]);

        let all: Vec<&str> = select(&fragments, 10).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(all, vec!["a", "b", "c"]);

        let newest: Vec<&str> = select(&fragments, 0).iter().map(|f| f.id.as_str()).collect();
        assert_eq!(newest, vec!["c"]);
    }

    #[test]
    fn render_prefixes_time_and_marks_images() {
        let text = Fragment::text("a", " coffee ", MORNING);
        let photo = Fragment::image("b", "blob://1", "", MORNING + 60_000);
        let captioned = Fragment::image("c", "blob://2", "the lake", MORNING + 120_000);
        let utc = FixedOffset::east_opt(0).unwrap();

        let rendered = render(&[&text, &photo, &captioned], utc);
        assert_eq!(rendered, "08:05 coffee\n08:06 [image]\n08:07 [image] the lake");
    }

    #[test]
    fn offset_shifts_clock_and_date() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let late = Fragment::text("a", "late", MORNING + 15 * 3_600_000);
        assert_eq!(render(&[&late], tokyo), "08:05 late");
        assert_eq!(date_of(late.timestamp_ms, tokyo).as_deref(), Some("2026-03-02"));
    }
}
