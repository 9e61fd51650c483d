// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{FetchError, PageFetcher};

/// Shared headless-browser instance. One per run: launched by the hosting
/// process, handed to the pipelines, closed once after the last batch.
/// Each fetch owns an exclusive page, so page access needs no locking; the
/// mutex only guards browser-level lifecycle calls.
pub struct BrowserEngine {
    browser: Mutex<Browser>,
    nav_timeout: Duration,
    settle: Duration,
}

impl BrowserEngine {
    /// Launches the browser process. Launch failure is fatal to the whole
    /// run and propagates to the caller.
    pub async fn launch(settings: &BrowserSettings) -> anyhow::Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 800)
            .request_timeout(Duration::from_secs(settings.nav_timeout_secs))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--mute-audio")
            .arg("--no-first-run");

        if let Some(path) = &settings.executable_path {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(anyhow::Error::msg)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch headless browser")?;

        // Drive CDP events for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            nav_timeout: Duration::from_secs(settings.nav_timeout_secs),
            settle: Duration::from_millis(settings.settle_millis),
        })
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        page.goto(url)
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        // Quiescence window: assume rendering finished once no further
        // activity has been requested within the settle delay.
        tokio::time::sleep(self.settle).await;
        page.content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }
}

#[async_trait]
impl PageFetcher for BrowserEngine {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?
        };

        let outcome = match tokio::time::timeout(self.nav_timeout, self.navigate(&page, url)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };

        // The page is released on every exit path, success or failure.
        if let Err(e) = page.close().await {
            debug!(url, error = %e, "page close failed");
        }

        outcome
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
    }
}
