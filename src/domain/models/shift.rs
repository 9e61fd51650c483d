// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// One attendance slot as rendered on a store's listing page for the current
/// day. Transient: produced by the parser, consumed by the classifier, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftEntry {
    /// Raw time-range text, e.g. `10:00〜18:00`, or a marker such as 受付終了.
    pub time_text: String,
    /// Nested status marker text, when the slot carries one (e.g. 待機中).
    pub status_text: Option<String>,
}

impl ShiftEntry {
    pub fn new(time_text: impl Into<String>, status_text: Option<String>) -> Self {
        Self {
            time_text: time_text.into(),
            status_text,
        }
    }
}

/// Classification result for one store's slate of shift entries.
///
/// Invariant: `total >= working >= idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftCounts {
    /// Slots declared for today, including fully-booked ones.
    pub total: u32,
    /// Slots whose declared window contains the current instant.
    pub working: u32,
    /// Working slots currently available per their status marker.
    pub idle: u32,
}
