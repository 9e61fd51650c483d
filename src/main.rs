// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use shiftwatch::config::settings::Settings;
use shiftwatch::engines::browser::BrowserEngine;
use shiftwatch::scrape::coordinator::{ConcurrencyPolicy, CoordinatorConfig, ScrapeCoordinator};
use shiftwatch::scrape::pipeline::BrowserScraper;
use shiftwatch::utils::retry_policy::RetryPolicy;
use shiftwatch::utils::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting shiftwatch...");

    let settings = Settings::new().context("failed to load configuration")?;

    let targets = read_targets(&settings.run.targets_file)
        .with_context(|| format!("failed to read targets from {}", settings.run.targets_file))?;
    if targets.is_empty() {
        warn!(file = %settings.run.targets_file, "no target urls configured, nothing to do");
        return Ok(());
    }
    info!(targets = targets.len(), "targets loaded");

    match settings.run.interval_minutes {
        None => run_once(&settings, &targets).await,
        Some(minutes) => {
            let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
            loop {
                interval.tick().await;
                // A failed run (browser did not start, output not writable)
                // is surfaced and the next tick retries the whole run.
                if let Err(e) = run_once(&settings, &targets).await {
                    error!(error = %e, "scrape run failed");
                }
            }
        }
    }
}

async fn run_once(settings: &Settings, targets: &[String]) -> anyhow::Result<()> {
    let retry = RetryPolicy::fixed(
        Duration::from_secs(settings.scrape.fetch_backoff_secs),
        settings.scrape.fetch_attempts,
    );

    let engine = BrowserEngine::launch(&settings.browser).await?;
    let scraper = Arc::new(BrowserScraper::new(
        engine,
        retry,
        settings.scrape.parse_attempts,
    ));

    let policy = match settings.scrape.policy.as_str() {
        "adaptive" => ConcurrencyPolicy::Adaptive {
            max_workers: settings.scrape.max_workers,
        },
        _ => ConcurrencyPolicy::Fixed(settings.scrape.fixed_workers),
    };
    let coordinator = ScrapeCoordinator::new(
        scraper,
        CoordinatorConfig {
            policy,
            batch_pause: Duration::from_secs(settings.scrape.batch_pause_secs),
        },
    );

    let results = coordinator.run(targets).await;
    let populated = results.iter().filter(|r| r.is_some()).count();
    info!(
        total = results.len(),
        populated,
        empty = results.len() - populated,
        "scrape run finished"
    );

    let json = serde_json::to_string_pretty(&results).context("failed to serialize results")?;
    match &settings.run.output_file {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {path}"))?;
            info!(path = %path, "results written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn read_targets(path: &str) -> anyhow::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
