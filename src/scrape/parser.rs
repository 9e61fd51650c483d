// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::domain::models::{ShiftEntry, StoreIdentity};

/// Typed parse outcome. `Unresolved` is not an error: the pipeline re-fetches
/// the page a bounded number of times before degrading the target to empty.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPage {
    /// The store name could not be resolved (template mismatch or an
    /// incomplete render).
    Unresolved,
    /// Identity resolved and the schedule container is present; `entries`
    /// holds today's shift blocks (possibly none).
    Resolved {
        identity: StoreIdentity,
        entries: Vec<ShiftEntry>,
        shift_time: Option<String>,
    },
    /// Identity resolved but the page has no schedule container at all: an
    /// open store with an empty schedule, all counts zero.
    EmptySchedule {
        identity: StoreIdentity,
        shift_time: Option<String>,
    },
}

static AREA_SEL: Lazy<Selector> = Lazy::new(|| sel("span#area_name"));
static HEADING_SEL: Lazy<Selector> = Lazy::new(|| sel("div.menushopname h1"));
static SHOPNAME_SEL: Lazy<Selector> = Lazy::new(|| sel("p.shopname"));
static BIZ_TYPE_SEL: Lazy<Selector> = Lazy::new(|| sel("p.type"));
static GENRE_SEL: Lazy<Selector> = Lazy::new(|| sel("p.genre"));
static SHOPTIME_SEL: Lazy<Selector> = Lazy::new(|| sel("p.shoptime"));
static SHIFTBOX_SEL: Lazy<Selector> = Lazy::new(|| sel("div.shiftbox"));
static DAY_LIST_SEL: Lazy<Selector> = Lazy::new(|| sel("ul.girlslist"));
static SLOT_SEL: Lazy<Selector> = Lazy::new(|| sel("li"));
static SLOT_TIME_SEL: Lazy<Selector> = Lazy::new(|| sel("p.time"));
static SLOT_STATUS_SEL: Lazy<Selector> = Lazy::new(|| sel("p.status"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Composite heading text: `name（biz_type/genre）`, fullwidth or ASCII
/// punctuation.
static COMPOSITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)[（(]([^/／）)]+)[/／]([^）)]+)[）)]\s*$")
        .expect("composite heading pattern is valid")
});

/// Extracts store identity and today's raw shift entries from rendered
/// markup. One pass over one fixed page-template family; no link discovery.
pub fn extract(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    let area = first_text(&document, &AREA_SEL).unwrap_or_default();
    let shift_time = first_text(&document, &SHOPTIME_SEL);

    let Some(identity) = resolve_identity(&document, area) else {
        return ParsedPage::Unresolved;
    };

    let Some(container) = document.select(&SHIFTBOX_SEL).next() else {
        return ParsedPage::EmptySchedule {
            identity,
            shift_time,
        };
    };

    // Lists inside the container are per-day; the first one is today.
    let entries = container
        .select(&DAY_LIST_SEL)
        .next()
        .map(collect_entries)
        .unwrap_or_default();

    ParsedPage::Resolved {
        identity,
        entries,
        shift_time,
    }
}

fn resolve_identity(document: &Html, area: String) -> Option<StoreIdentity> {
    if let Some(heading) = first_text(document, &HEADING_SEL) {
        if let Some(caps) = COMPOSITE_RE.captures(&heading) {
            return Some(StoreIdentity::new(
                caps[1].trim().to_string(),
                caps[2].trim().to_string(),
                caps[3].trim().to_string(),
                area,
            ));
        }
        // Heading present but not composite: take it as the bare name and
        // pick the components up from their own elements.
        return Some(StoreIdentity::new(
            heading,
            first_text(document, &BIZ_TYPE_SEL).unwrap_or_default(),
            first_text(document, &GENRE_SEL).unwrap_or_default(),
            area,
        ));
    }

    let name = first_text(document, &SHOPNAME_SEL)?;
    Some(StoreIdentity::new(
        name,
        first_text(document, &BIZ_TYPE_SEL).unwrap_or_default(),
        first_text(document, &GENRE_SEL).unwrap_or_default(),
        area,
    ))
}

fn collect_entries(today: ElementRef<'_>) -> Vec<ShiftEntry> {
    today
        .select(&SLOT_SEL)
        .map(|slot| {
            let time_text = slot
                .select(&SLOT_TIME_SEL)
                .next()
                .map(element_text)
                .unwrap_or_else(|| element_text(slot));
            let status_text = slot
                .select(&SLOT_STATUS_SEL)
                .next()
                .map(element_text)
                .filter(|s| !s.is_empty());
            ShiftEntry::new(time_text, status_text)
        })
        .collect()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UNKNOWN;

    const FULL_PAGE: &str = r#"
        <html><body>
          <span id="area_name">新宿・歌舞伎町</span>
          <div class="menushopname none"><h1>クラブ蒼山（デリヘル/人妻）</h1></div>
          <p class="shoptime">10:00〜翌3:00</p>
          <div class="shiftbox">
            <ul class="girlslist">
              <li><p class="time">10:00〜18:00</p><p class="status">待機中</p></li>
              <li><p class="time">12:00〜20:00</p><p class="status">案内中</p></li>
              <li><p class="time">受付終了</p></li>
            </ul>
            <ul class="girlslist">
              <li><p class="time">11:00〜19:00</p></li>
            </ul>
          </div>
        </body></html>"#;

    #[test]
    fn composite_heading_resolves_full_identity() {
        let ParsedPage::Resolved { identity, .. } = extract(FULL_PAGE) else {
            panic!("expected resolved page");
        };
        assert_eq!(identity.store_name, "クラブ蒼山");
        assert_eq!(identity.biz_type, "デリヘル");
        assert_eq!(identity.genre, "人妻");
        assert_eq!(identity.area, "新宿・歌舞伎町");
    }

    #[test]
    fn only_the_first_day_list_is_collected() {
        let ParsedPage::Resolved { entries, .. } = extract(FULL_PAGE) else {
            panic!("expected resolved page");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].time_text, "10:00〜18:00");
        assert_eq!(entries[0].status_text.as_deref(), Some("待機中"));
        assert_eq!(entries[1].status_text.as_deref(), Some("案内中"));
        assert_eq!(entries[2].time_text, "受付終了");
        assert_eq!(entries[2].status_text, None);
        // The 11:00〜19:00 slot belongs to tomorrow's list.
        assert!(entries.iter().all(|e| e.time_text != "11:00〜19:00"));
    }

    #[test]
    fn shift_time_summary_is_captured() {
        let ParsedPage::Resolved { shift_time, .. } = extract(FULL_PAGE) else {
            panic!("expected resolved page");
        };
        assert_eq!(shift_time.as_deref(), Some("10:00〜翌3:00"));
    }

    #[test]
    fn fallback_selectors_resolve_identity() {
        let html = r#"
            <html><body>
              <p class="shopname">スナック白鳥</p>
              <p class="type">キャバクラ</p>
              <p class="genre">熟女</p>
              <div class="shiftbox"><ul class="girlslist"></ul></div>
            </body></html>"#;
        let ParsedPage::Resolved { identity, entries, .. } = extract(html) else {
            panic!("expected resolved page");
        };
        assert_eq!(identity.store_name, "スナック白鳥");
        assert_eq!(identity.biz_type, "キャバクラ");
        assert_eq!(identity.genre, "熟女");
        assert_eq!(identity.area, UNKNOWN);
        assert!(entries.is_empty());
    }

    #[test]
    fn ascii_parentheses_are_accepted() {
        let html = r#"<div class="menushopname"><h1>Bar Luna(バー/カジュアル)</h1></div>
                      <div class="shiftbox"></div>"#;
        let ParsedPage::Resolved { identity, .. } = extract(html) else {
            panic!("expected resolved page");
        };
        assert_eq!(identity.store_name, "Bar Luna");
        assert_eq!(identity.biz_type, "バー");
        assert_eq!(identity.genre, "カジュアル");
    }

    #[test]
    fn non_composite_heading_falls_back_to_component_elements() {
        let html = r#"
            <div class="menushopname"><h1>クラブ紅</h1></div>
            <p class="type">ソープ</p>
            <div class="shiftbox"></div>"#;
        let ParsedPage::Resolved { identity, .. } = extract(html) else {
            panic!("expected resolved page");
        };
        assert_eq!(identity.store_name, "クラブ紅");
        assert_eq!(identity.biz_type, "ソープ");
        assert_eq!(identity.genre, UNKNOWN);
    }

    #[test]
    fn missing_name_is_unresolved() {
        let html = r#"<span id="area_name">渋谷</span><div class="shiftbox"></div>"#;
        assert_eq!(extract(html), ParsedPage::Unresolved);
    }

    #[test]
    fn blank_page_is_unresolved() {
        assert_eq!(extract(""), ParsedPage::Unresolved);
    }

    #[test]
    fn missing_schedule_container_is_a_valid_empty_schedule() {
        let html = r#"
            <span id="area_name">池袋</span>
            <div class="menushopname"><h1>ラウンジ月（ラウンジ/一般）</h1></div>"#;
        let ParsedPage::EmptySchedule { identity, .. } = extract(html) else {
            panic!("expected empty schedule");
        };
        assert_eq!(identity.store_name, "ラウンジ月");
        assert_eq!(identity.area, "池袋");
    }

    #[test]
    fn container_without_day_list_yields_no_entries() {
        let html = r#"
            <div class="menushopname"><h1>店舗X（デリヘル/一般）</h1></div>
            <div class="shiftbox"><p>本日の出勤情報はありません</p></div>"#;
        let ParsedPage::Resolved { entries, .. } = extract(html) else {
            panic!("expected resolved page");
        };
        assert!(entries.is_empty());
    }

    #[test]
    fn slot_without_time_element_uses_block_text() {
        let html = r#"
            <div class="menushopname"><h1>店舗Y（デリヘル/一般）</h1></div>
            <div class="shiftbox"><ul class="girlslist">
              <li>14:00〜22:00</li>
            </ul></div>"#;
        let ParsedPage::Resolved { entries, .. } = extract(html) else {
            panic!("expected resolved page");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time_text, "14:00〜22:00");
    }
}
