// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Days, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::models::{ShiftCounts, ShiftEntry};

/// Markers for slots declared for a later day or a day off. Such entries are
/// excluded from every count.
const REST_MARKERS: &[&str] = &["明日", "次回", "翌日", "お休み", "休み"];

/// Markers for slots that are filled for the day: counted in total only,
/// since they carry no comparable time window.
const FULLY_BOOKED_MARKERS: &[&str] = &["受付終了", "満了"];

/// Status-marker keywords that mean the staff member is currently available.
const WAITING_MARKERS: &[&str] = &["待機中", "即案内"];

static TIME_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    // Pages use a mix of ASCII and fullwidth separators.
    Regex::new(r"(\d{1,2})[:：](\d{2})\s*[〜～~\-−]\s*(\d{1,2})[:：](\d{2})")
        .expect("time range pattern is valid")
});

/// Classifies one store's shift entries against the current instant.
///
/// Pure and deterministic: identical entries and `now` always produce
/// identical counts. Output satisfies `total >= working >= idle`.
pub fn classify(entries: &[ShiftEntry], now: NaiveDateTime) -> ShiftCounts {
    let mut counts = ShiftCounts::default();

    for entry in entries {
        let text = entry.time_text.trim();

        if REST_MARKERS.iter().any(|m| text.contains(m)) {
            continue;
        }

        if FULLY_BOOKED_MARKERS.iter().any(|m| text.contains(m)) {
            counts.total += 1;
            continue;
        }

        let Some((start, end)) = parse_time_range(text) else {
            debug!(text, "unrecognized shift text, skipping");
            continue;
        };
        counts.total += 1;

        let (start_at, end_at) = anchor_window(start, end, now);
        if start_at <= now && now <= end_at {
            counts.working += 1;
            if is_waiting(entry.status_text.as_deref()) {
                counts.idle += 1;
            }
        }
    }

    counts
}

/// A working entry counts as idle when its marker names a waiting state, or
/// when no marker text is present at all. The absence default mirrors the
/// monitored template, where staff busy with a customer always carry a
/// marker; see the design notes on this bias.
fn is_waiting(status_text: Option<&str>) -> bool {
    match status_text.map(str::trim) {
        None | Some("") => true,
        Some(marker) => WAITING_MARKERS.iter().any(|m| marker.contains(m)),
    }
}

fn parse_time_range(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let caps = TIME_RANGE_RE.captures(text)?;
    let start = hhmm(&caps[1], &caps[2])?;
    let end = hhmm(&caps[3], &caps[4])?;
    Some((start, end))
}

fn hhmm(hours: &str, minutes: &str) -> Option<NaiveTime> {
    let h: u32 = hours.parse().ok()?;
    let m: u32 = minutes.parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Anchors a time-of-day window to concrete instants around `now`. A window
/// whose end precedes its start spans midnight; it is pinned to the
/// interpretation that could contain `now`: yesterday→today while `now` is
/// still before the end time, today→tomorrow otherwise.
fn anchor_window(
    start: NaiveTime,
    end: NaiveTime,
    now: NaiveDateTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let today = now.date();
    if end < start {
        if now.time() < end {
            ((today - Days::new(1)).and_time(start), today.and_time(end))
        } else {
            (today.and_time(start), (today + Days::new(1)).and_time(end))
        }
    } else {
        (today.and_time(start), today.and_time(end))
    }
}
