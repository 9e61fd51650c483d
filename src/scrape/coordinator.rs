// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::domain::models::StoreRecord;
use crate::scrape::pipeline::StoreScraper;
use crate::scrape::resources::{self, ConcurrencyPlan, SystemMonitor, DEFAULT_FIXED_WORKERS};

/// How run sizing is derived. The two variants reflect the two invocation
/// paths the system supports: a fixed bound for dedicated scrape hosts, and
/// an adaptive 1–3 worker bound for shared ones. Both configure the same
/// coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Fixed worker bound, no resource sampling.
    Fixed(usize),
    /// ResourceMonitor-derived bound; `max_workers` caps it, CPU count
    /// derives the default cap.
    Adaptive { max_workers: Option<usize> },
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_FIXED_WORKERS)
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub policy: ConcurrencyPolicy,
    /// Pause between consecutive batches. Bounds sustained load on the
    /// target sites and the local renderer.
    pub batch_pause: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            policy: ConcurrencyPolicy::default(),
            batch_pause: Duration::from_secs(2),
        }
    }
}

/// Orchestrates one scrape run: batches targets, bounds in-flight pipelines
/// with a counting permit, isolates per-target failures, and reassembles
/// results into input order.
pub struct ScrapeCoordinator<S: StoreScraper + 'static> {
    scraper: Arc<S>,
    config: CoordinatorConfig,
}

impl<S: StoreScraper + 'static> ScrapeCoordinator<S> {
    pub fn new(scraper: Arc<S>, config: CoordinatorConfig) -> Self {
        Self { scraper, config }
    }

    fn resolve_plan(&self, total_targets: usize) -> ConcurrencyPlan {
        match self.config.policy {
            ConcurrencyPolicy::Fixed(workers) => {
                resources::plan_with_workers(total_targets, workers)
            }
            ConcurrencyPolicy::Adaptive { max_workers } => {
                let mut monitor = SystemMonitor::new();
                let sample = monitor.sample();
                resources::plan(total_targets, max_workers, monitor.cpu_count(), &sample)
            }
        }
    }

    /// Runs every target through a pipeline and returns one result per
    /// target, position-aligned with the input. `None` marks targets that
    /// produced no data; no per-target failure aborts siblings or the run.
    pub async fn run(&self, targets: &[String]) -> Vec<Option<StoreRecord>> {
        if targets.is_empty() {
            return Vec::new();
        }

        let plan = self.resolve_plan(targets.len());
        info!(
            targets = targets.len(),
            workers = plan.worker_count,
            batch_size = plan.batch_size,
            "scrape run starting"
        );

        let semaphore = Arc::new(Semaphore::new(plan.worker_count));
        let mut results: Vec<Option<StoreRecord>> = Vec::with_capacity(targets.len());
        results.resize_with(targets.len(), || None);

        let mut offset = 0;
        for (batch_no, batch) in targets.chunks(plan.batch_size).enumerate() {
            info!(
                batch = batch_no + 1,
                from = offset + 1,
                to = offset + batch.len(),
                total = targets.len(),
                "batch starting"
            );

            let mut handles = Vec::with_capacity(batch.len());
            for (i, target) in batch.iter().enumerate() {
                let index = offset + i;
                let semaphore = Arc::clone(&semaphore);
                let scraper = Arc::clone(&self.scraper);
                let target = target.clone();
                handles.push((
                    index,
                    tokio::spawn(async move {
                        let Ok(_permit) = semaphore.acquire_owned().await else {
                            return None;
                        };
                        scraper.scrape(&target).await
                    }),
                ));
            }

            // Batch barrier: every pipeline finishes, successfully or as an
            // empty, before the next batch starts.
            let mut succeeded = 0usize;
            for (index, handle) in handles {
                match handle.await {
                    Ok(result) => {
                        if result.is_some() {
                            succeeded += 1;
                        }
                        results[index] = result;
                    }
                    Err(e) => {
                        error!(index, error = %e, "pipeline task aborted");
                    }
                }
            }

            info!(
                batch = batch_no + 1,
                succeeded,
                of = batch.len(),
                "batch finished"
            );

            offset += batch.len();
            if offset < targets.len() {
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        // The shared browser is closed exactly once, after the last batch.
        self.scraper.shutdown().await;

        results
    }
}
