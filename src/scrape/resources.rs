// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

/// Worker bound used when the adaptive policy is not selected.
pub const DEFAULT_FIXED_WORKERS: usize = 20;

/// Above this memory utilization the adaptive planner sheds one worker.
const MEMORY_PRESSURE_PERCENT: f32 = 80.0;
/// Below this much free memory the run is forced down to a single worker.
const LOW_MEMORY_FLOOR_MB: u64 = 1000;

/// Point-in-time utilization reading. Taken fresh at plan time, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub available_memory_mb: u64,
}

/// Derived sizing for one scrape run.
///
/// Invariants: `worker_count >= 1`; `batch_size <= total_targets` and
/// `batch_size >= 1` whenever there is at least one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyPlan {
    pub batch_size: usize,
    pub worker_count: usize,
}

/// Reads CPU and memory state through `sysinfo`, scoped to what planning
/// needs. Sampling happens once per run, at plan time; utilization is not
/// tracked continuously while batches execute.
pub struct SystemMonitor {
    system: System,
}

impl SystemMonitor {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        system.refresh_all();
        Self { system }
    }

    pub fn sample(&mut self) -> ResourceSample {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let memory_percent = if total > 0 {
            (self.system.used_memory() as f64 / total as f64 * 100.0) as f32
        } else {
            0.0
        };

        let sample = ResourceSample {
            cpu_percent: self.system.global_cpu_usage(),
            memory_percent,
            available_memory_mb: self.system.available_memory() / (1024 * 1024),
        };
        debug!(
            cpu = sample.cpu_percent,
            memory = sample.memory_percent,
            available_mb = sample.available_memory_mb,
            "resource sample"
        );
        sample
    }

    pub fn cpu_count(&self) -> usize {
        self.system.cpus().len()
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Default adaptive worker ceiling: half the cores plus one, capped at 3.
pub fn default_max_workers(cpu_count: usize) -> usize {
    (cpu_count / 2 + 1).clamp(1, 3)
}

/// Derives the concurrency plan for a run. Pure function of the sample, the
/// CPU count and the target count; holds no state between runs.
pub fn plan(
    total_targets: usize,
    max_workers: Option<usize>,
    cpu_count: usize,
    sample: &ResourceSample,
) -> ConcurrencyPlan {
    let mut workers = max_workers
        .unwrap_or_else(|| default_max_workers(cpu_count))
        .max(1);

    if sample.memory_percent > MEMORY_PRESSURE_PERCENT {
        workers = (workers - 1).max(1);
    }
    if sample.available_memory_mb < LOW_MEMORY_FLOOR_MB {
        workers = 1;
    }

    plan_with_workers(total_targets, workers)
}

/// Sizes batches for a fixed worker count.
pub fn plan_with_workers(total_targets: usize, worker_count: usize) -> ConcurrencyPlan {
    let worker_count = worker_count.max(1);
    let per_worker_cap = (1000 / worker_count).clamp(5, 20);
    let batch_size = (per_worker_cap * worker_count).clamp(1, total_targets.max(1));
    ConcurrencyPlan {
        batch_size,
        worker_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy_sample() -> ResourceSample {
        ResourceSample {
            cpu_percent: 20.0,
            memory_percent: 40.0,
            available_memory_mb: 8000,
        }
    }

    #[test]
    fn default_worker_ceiling_tracks_cpu_count() {
        assert_eq!(default_max_workers(1), 1);
        assert_eq!(default_max_workers(2), 2);
        assert_eq!(default_max_workers(4), 3);
        assert_eq!(default_max_workers(16), 3);
    }

    #[test]
    fn healthy_system_uses_requested_workers() {
        assert_eq!(plan(100, Some(3), 6, &healthy_sample()).worker_count, 3);
    }

    #[test]
    fn memory_pressure_sheds_one_worker() {
        let sample = ResourceSample {
            memory_percent: 85.0,
            ..healthy_sample()
        };
        assert_eq!(plan(100, Some(3), 6, &sample).worker_count, 2);
        // Never below one.
        assert_eq!(plan(100, Some(1), 6, &sample).worker_count, 1);
    }

    #[test]
    fn low_available_memory_forces_single_worker() {
        let sample = ResourceSample {
            cpu_percent: 5.0,
            memory_percent: 30.0,
            available_memory_mb: 512,
        };
        // Irrespective of CPU count or requested workers.
        assert_eq!(plan(5000, Some(3), 32, &sample).worker_count, 1);
    }

    #[test]
    fn batch_size_never_exceeds_target_count() {
        let plan = plan_with_workers(7, 3);
        assert_eq!(plan.batch_size, 7);

        let plan = plan_with_workers(1, 20);
        assert_eq!(plan.batch_size, 1);
    }

    #[test]
    fn batch_size_follows_per_worker_cap() {
        // 1000/3 = 333, capped at 20 per worker.
        let plan = plan_with_workers(500, 3);
        assert_eq!(plan.batch_size, 60);

        // 1000/20 = 50, capped at 20 per worker.
        let plan = plan_with_workers(5000, 20);
        assert_eq!(plan.batch_size, 400);

        // 1000/100 = 10, within the 5..=20 band.
        let plan = plan_with_workers(5000, 100);
        assert_eq!(plan.batch_size, 1000);
    }

    #[test]
    fn worker_count_has_a_floor_of_one() {
        let plan = plan_with_workers(10, 0);
        assert_eq!(plan.worker_count, 1);
        assert_eq!(plan.batch_size, 10);
    }
}
