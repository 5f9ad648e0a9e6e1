// src/pagespeed.rs
// =============================================================================
// Client for the PageSpeed Insights v5 API (Lighthouse performance audit).
//
// This is an optional data source: without an API key it does nothing, and
// any network or parse failure only removes the performance block from the
// report. It never fails an analysis run.
// =============================================================================

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PageSpeedConfig;
use crate::error::{AnalysisError, Result};
use crate::fetch::describe_error;

// Lighthouse runs take a while; this overrides the client's default timeout
const PAGESPEED_TIMEOUT: Duration = Duration::from_secs(90);

/// Device profile Lighthouse emulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Desktop,
    Mobile,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Desktop => "desktop",
            Strategy::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of a Lighthouse result we report on
///
/// Timings are Lighthouse's own display strings (e.g. "1.2 s").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 0-100
    pub performance_score: Option<f64>,
    pub first_contentful_paint: Option<String>,
    pub speed_index: Option<String>,
    pub largest_contentful_paint: Option<String>,
    pub interactive: Option<String>,
    pub total_blocking_time: Option<String>,
    pub cumulative_layout_shift: Option<String>,
    pub dom_size: Option<String>,
    pub total_byte_weight: Option<String>,
    pub network_requests: Option<usize>,
}

/// Desktop and mobile results for one page; a failed strategy is None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub desktop: Option<PerformanceMetrics>,
    pub mobile: Option<PerformanceMetrics>,
}

impl PerformanceSummary {
    /// Time to interactive on desktop, used as "page load time"
    pub fn load_time(&self) -> Option<&str> {
        self.desktop.as_ref()?.interactive.as_deref()
    }
}

// Wire format, only the fields we read

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(rename = "lighthouseResult")]
    lighthouse: LighthouseResult,
}

#[derive(Deserialize)]
struct LighthouseResult {
    categories: Categories,
    #[serde(default)]
    audits: HashMap<String, Audit>,
}

#[derive(Deserialize)]
struct Categories {
    performance: CategoryScore,
}

#[derive(Deserialize)]
struct CategoryScore {
    score: Option<f64>,
}

#[derive(Deserialize)]
struct Audit {
    #[serde(rename = "displayValue")]
    display_value: Option<String>,
    details: Option<AuditDetails>,
}

#[derive(Deserialize)]
struct AuditDetails {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

fn metrics_from(result: LighthouseResult) -> PerformanceMetrics {
    let display = |id: &str| {
        result
            .audits
            .get(id)
            .and_then(|audit| audit.display_value.clone())
    };

    PerformanceMetrics {
        performance_score: result.categories.performance.score.map(|s| s * 100.0),
        first_contentful_paint: display("first-contentful-paint"),
        speed_index: display("speed-index"),
        largest_contentful_paint: display("largest-contentful-paint"),
        interactive: display("interactive"),
        total_blocking_time: display("total-blocking-time"),
        cumulative_layout_shift: display("cumulative-layout-shift"),
        dom_size: display("dom-size"),
        total_byte_weight: display("total-byte-weight"),
        network_requests: result
            .audits
            .get("network-requests")
            .and_then(|audit| audit.details.as_ref())
            .map(|details| details.items.len()),
    }
}

pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PageSpeedClient {
    pub fn new(client: Client, config: &PageSpeedConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.key().map(str::to_string),
        }
    }

    /// False when no API key is configured
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Runs one Lighthouse audit of `url`
    pub async fn fetch_performance_metrics(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> Result<PerformanceMetrics> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::PerformanceApi("no API key configured".to_string()))?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("strategy", strategy.as_str()),
                ("category", "performance"),
                ("key", key),
            ])
            .timeout(PAGESPEED_TIMEOUT)
            .send()
            .await
            .map_err(|e| AnalysisError::PerformanceApi(describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::PerformanceApi(format!("HTTP {}", status)));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::PerformanceApi(format!("unexpected response: {}", e)))?;

        debug!(url, %strategy, "PageSpeed metrics received");
        Ok(metrics_from(body.lighthouse))
    }

    // Fetches desktop and mobile concurrently
    //
    // Returns None if disabled or if both strategies failed.
    pub async fn summary(&self, url: &str) -> Option<PerformanceSummary> {
        if !self.is_enabled() {
            return None;
        }

        let (desktop, mobile) = tokio::join!(
            self.fetch_performance_metrics(url, Strategy::Desktop),
            self.fetch_performance_metrics(url, Strategy::Mobile),
        );

        let keep = |strategy: Strategy, result: Result<PerformanceMetrics>| match result {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(url, %strategy, "PageSpeed unavailable: {}", e);
                None
            }
        };

        let summary = PerformanceSummary {
            desktop: keep(Strategy::Desktop, desktop),
            mobile: keep(Strategy::Mobile, mobile),
        };

        if summary.desktop.is_none() && summary.mobile.is_none() {
            None
        } else {
            Some(summary)
        }
    }
}
