// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration.
///
/// Layered sources: built-in defaults, then `config/default` and
/// `config/{APP_ENVIRONMENT}` files when present, then environment variables
/// with the `SHIFTWATCH` prefix (`SHIFTWATCH_SCRAPE__POLICY=fixed`).
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Headless browser configuration
    pub browser: BrowserSettings,
    /// Scraping engine configuration
    pub scrape: ScrapeSettings,
    /// Run-level input/output configuration
    pub run: RunSettings,
}

/// Headless browser configuration
#[derive(Debug, Deserialize)]
pub struct BrowserSettings {
    /// Path to the Chromium/Chrome executable; autodetected when unset
    pub executable_path: Option<String>,
    /// Run without a visible window
    pub headless: bool,
    /// Per-attempt navigation timeout in seconds
    pub nav_timeout_secs: u64,
    /// Quiescence window after navigation settles, in milliseconds
    pub settle_millis: u64,
}

/// Scraping engine configuration
#[derive(Debug, Deserialize)]
pub struct ScrapeSettings {
    /// Concurrency policy: "fixed" or "adaptive"
    pub policy: String,
    /// Worker bound for the fixed policy
    pub fixed_workers: usize,
    /// Worker ceiling for the adaptive policy; derived from CPU count when unset
    pub max_workers: Option<usize>,
    /// Pause between batches, in seconds
    pub batch_pause_secs: u64,
    /// Fetch attempts per page before the target degrades to empty
    pub fetch_attempts: u32,
    /// Backoff between failed fetch attempts, in seconds
    pub fetch_backoff_secs: u64,
    /// Parse attempts while the store identity stays unresolved
    pub parse_attempts: u32,
}

/// Run-level input/output configuration
#[derive(Debug, Deserialize)]
pub struct RunSettings {
    /// File with one target store URL per line
    pub targets_file: String,
    /// JSON output destination; stdout when unset
    pub output_file: Option<String>,
    /// Re-run the whole scrape every N minutes; run once when unset
    pub interval_minutes: Option<u64>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Browser defaults
            .set_default("browser.headless", true)?
            .set_default("browser.nav_timeout_secs", 20)?
            .set_default("browser.settle_millis", 1000)?
            // Scrape defaults
            .set_default("scrape.policy", "fixed")?
            .set_default("scrape.fixed_workers", 20)?
            .set_default("scrape.batch_pause_secs", 2)?
            .set_default("scrape.fetch_attempts", 3)?
            .set_default("scrape.fetch_backoff_secs", 5)?
            .set_default("scrape.parse_attempts", 3)?
            // Run defaults
            .set_default("run.targets_file", "targets.txt")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SHIFTWATCH").separator("__"));

        builder.build()?.try_deserialize()
    }
}
