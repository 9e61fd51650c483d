// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shiftwatch::engines::traits::{FetchError, PageFetcher};
use shiftwatch::scrape::coordinator::{ConcurrencyPolicy, CoordinatorConfig, ScrapeCoordinator};
use shiftwatch::scrape::pipeline::BrowserScraper;
use shiftwatch::utils::retry_policy::RetryPolicy;

const STORE_A_PAGE: &str = r#"
    <html><body>
      <span id="area_name">新宿</span>
      <div class="menushopname none"><h1>店舗A（デリヘル/一般）</h1></div>
      <p class="shoptime">10:00〜翌3:00</p>
      <div class="shiftbox">
        <ul class="girlslist">
          <li><p class="time">10:00〜18:00</p><p class="status">待機中</p></li>
          <li><p class="time">受付終了</p></li>
        </ul>
      </div>
    </body></html>"#;

/// Serves store A's page and times out on everything else.
struct FixtureFetcher {
    fetches_b: Arc<AtomicU32>,
    shutdowns: Arc<AtomicU32>,
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.contains("/store-a/") {
            Ok(STORE_A_PAGE.to_string())
        } else {
            self.fetches_b.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Timeout)
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

fn two_pm() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 8, 24)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn full_run_classifies_and_isolates_failures() {
    let fetches_b = Arc::new(AtomicU32::new(0));
    let shutdowns = Arc::new(AtomicU32::new(0));
    let fetcher = FixtureFetcher {
        fetches_b: Arc::clone(&fetches_b),
        shutdowns: Arc::clone(&shutdowns),
    };
    let scraper = Arc::new(
        BrowserScraper::new(fetcher, RetryPolicy::zero_delay(3), 3).with_clock(two_pm),
    );
    let coordinator = ScrapeCoordinator::new(
        Arc::clone(&scraper),
        CoordinatorConfig {
            policy: ConcurrencyPolicy::Fixed(2),
            batch_pause: Duration::from_millis(0),
        },
    );

    let targets = vec![
        "https://example.com/store-a".to_string(),
        "https://example.com/store-b".to_string(),
    ];
    let results = coordinator.run(&targets).await;

    assert_eq!(results.len(), 2);

    // Store A: one slot working and waiting at 14:00, one fully booked.
    let record = results[0].as_ref().expect("store A should resolve");
    assert_eq!(record.store_name, "店舗A");
    assert_eq!(record.biz_type, "デリヘル");
    assert_eq!(record.genre, "一般");
    assert_eq!(record.area, "新宿");
    assert_eq!(record.total_staff, 2);
    assert_eq!(record.working_staff, 1);
    assert_eq!(record.active_staff, 1);
    assert_eq!(record.source_url, "https://example.com/store-a");
    assert_eq!(record.shift_time.as_deref(), Some("10:00〜翌3:00"));

    // Store B: all three fetch attempts failed, empty sentinel, nothing
    // partially populated.
    assert!(results[1].is_none());
    assert_eq!(fetches_b.load(Ordering::SeqCst), 3);

    // The shared browser resource is released exactly once.
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}
