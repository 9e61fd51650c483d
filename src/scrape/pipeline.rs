// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::domain::models::{ShiftCounts, StoreRecord};
use crate::engines::traits::PageFetcher;
use crate::scrape::classifier;
use crate::scrape::parser::{self, ParsedPage};
use crate::utils::retry_policy::RetryPolicy;

/// Fixed relative path from a configured store URL to its attendance listing
/// page.
pub const LISTING_PATH: &str = "attend/";

/// One fetch→parse→classify pipeline for a single target. The coordinator
/// only sees this seam; production uses [`BrowserScraper`], tests substitute
/// mocks.
#[async_trait]
pub trait StoreScraper: Send + Sync {
    /// Scrapes one target URL. `None` is the empty sentinel: no data for
    /// this target, for whatever reason. Never panics across this boundary.
    async fn scrape(&self, target: &str) -> Option<StoreRecord>;

    /// Releases shared resources once, after all batches complete.
    async fn shutdown(&self) {}
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Production pipeline over a shared headless browser.
pub struct BrowserScraper<F: PageFetcher> {
    fetcher: F,
    retry: RetryPolicy,
    parse_attempts: u32,
    clock: Clock,
}

impl<F: PageFetcher> BrowserScraper<F> {
    pub fn new(fetcher: F, retry: RetryPolicy, parse_attempts: u32) -> Self {
        Self {
            fetcher,
            retry,
            parse_attempts: parse_attempts.max(1),
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    /// Replaces the classification clock. Tests pin it to a fixed instant.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Full retry chain around single fetch attempts, with the policy's
    /// backoff between failures. Exhaustion is definitive for this chain.
    async fn fetch_with_retry(&self, url: &str) -> Option<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.fetcher.fetch(url).await {
                Ok(html) => return Some(html),
                Err(e) => {
                    warn!(url, attempt, error = %e, "page fetch failed");
                    if !self.retry.should_retry(attempt) {
                        return None;
                    }
                    tokio::time::sleep(self.retry.calculate_backoff(attempt)).await;
                }
            }
        }
    }
}

/// Resolves the attendance listing page for a configured store URL.
pub fn listing_url(target: &str) -> Result<String, url::ParseError> {
    let base = if target.ends_with('/') {
        Url::parse(target)?
    } else {
        // A trailing slash keeps the last path segment when joining.
        Url::parse(&format!("{target}/"))?
    };
    Ok(base.join(LISTING_PATH)?.to_string())
}

#[async_trait]
impl<F: PageFetcher> StoreScraper for BrowserScraper<F> {
    #[instrument(skip(self))]
    async fn scrape(&self, target: &str) -> Option<StoreRecord> {
        let url = match listing_url(target) {
            Ok(url) => url,
            Err(e) => {
                warn!(target, error = %e, "invalid target url");
                return None;
            }
        };

        let now = (self.clock)();

        // An unresolved identity usually means an incomplete render, so the
        // whole page is fetched again, up to the attempt budget.
        for attempt in 1..=self.parse_attempts {
            let html = self.fetch_with_retry(&url).await?;

            match parser::extract(&html) {
                ParsedPage::Resolved {
                    identity,
                    entries,
                    shift_time,
                } => {
                    let counts = classifier::classify(&entries, now);
                    info!(
                        store = %identity.store_name,
                        total = counts.total,
                        working = counts.working,
                        idle = counts.idle,
                        "store scraped"
                    );
                    return Some(StoreRecord::new(
                        identity,
                        counts,
                        target.to_string(),
                        shift_time,
                    ));
                }
                ParsedPage::EmptySchedule {
                    identity,
                    shift_time,
                } => {
                    debug!(store = %identity.store_name, "no schedule container, zero activity");
                    return Some(StoreRecord::new(
                        identity,
                        ShiftCounts::default(),
                        target.to_string(),
                        shift_time,
                    ));
                }
                ParsedPage::Unresolved => {
                    warn!(url, attempt, "store identity unresolved");
                }
            }
        }

        None
    }

    async fn shutdown(&self) {
        self.fetcher.shutdown().await;
    }
}
