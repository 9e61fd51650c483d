// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;

use crate::domain::models::shift::ShiftCounts;

/// Sentinel for identity fields that could not be resolved from the page.
pub const UNKNOWN: &str = "unknown";

/// Store identity as resolved from the listing page header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreIdentity {
    pub store_name: String,
    pub biz_type: String,
    pub genre: String,
    pub area: String,
}

impl StoreIdentity {
    /// Builds an identity, substituting the `unknown` sentinel for any
    /// component the parser left empty. The store name is never substituted;
    /// a page without a resolvable name does not produce an identity at all.
    pub fn new(store_name: String, biz_type: String, genre: String, area: String) -> Self {
        let or_unknown = |s: String| {
            if s.trim().is_empty() {
                UNKNOWN.to_string()
            } else {
                s
            }
        };
        Self {
            store_name,
            biz_type: or_unknown(biz_type),
            genre: or_unknown(genre),
            area: or_unknown(area),
        }
    }
}

/// One per-store occupancy snapshot, produced once per successful scrape and
/// handed to the caller by value. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreRecord {
    pub store_name: String,
    pub biz_type: String,
    pub genre: String,
    pub area: String,
    pub total_staff: u32,
    pub working_staff: u32,
    pub active_staff: u32,
    pub source_url: String,
    pub shift_time: Option<String>,
}

impl StoreRecord {
    pub fn new(
        identity: StoreIdentity,
        counts: ShiftCounts,
        source_url: String,
        shift_time: Option<String>,
    ) -> Self {
        Self {
            store_name: identity.store_name,
            biz_type: identity.biz_type,
            genre: identity.genre,
            area: identity.area,
            total_staff: counts.total,
            working_staff: counts.working,
            active_staff: counts.idle,
            source_url,
            shift_time,
        }
    }
}
