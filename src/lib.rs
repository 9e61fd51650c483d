// Copyright (c) 2026 shiftwatch contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Configuration module
///
/// Layered settings for the browser, the engine and the run
pub mod config;

/// Domain module
///
/// Occupancy records and shift entries
pub mod domain;

/// Engines module
///
/// Headless-browser page fetching
pub mod engines;

/// Scrape module
///
/// Parser, classifier, resource planner and the run coordinator
pub mod scrape;

/// Utils module
///
/// Retry policy and telemetry helpers
pub mod utils;
