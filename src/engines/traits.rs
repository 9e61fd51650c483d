// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// Transient per-attempt fetch failure. Retried by the pipeline up to its
/// attempt budget, then degrades the target to an empty result; never
/// propagated past the pipeline boundary.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Navigation did not complete within the per-attempt timeout
    #[error("navigation timed out")]
    Timeout,
    /// Navigation failed before the page settled
    #[error("navigation failed: {0}")]
    Navigation(String),
    /// The browser rejected the operation (page creation, content read)
    #[error("browser error: {0}")]
    Browser(String),
}

/// Single-attempt page fetch: navigate, wait for quiescence, return rendered
/// HTML. Retry chains are layered on top by the caller so tests can drive
/// them with a zero-delay policy.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Releases the shared browser resource. Called once, after all batches.
    async fn shutdown(&self) {}
}
