// src/analyzer.rs
// =============================================================================
// One complete page analysis, start to finish.
//
// Control flow:
//   validate target -> fetch page -> parse (resources + DOM metrics)
//     -> [ size resources | time the server | PageSpeed ] concurrently
//     -> categorize, score, grade -> PageReport
//
// analyze() returns a typed Result for callers that want to branch on the
// error kind; check_page() always returns displayable text, which is what
// both the CLI and a page renderer print.
// =============================================================================

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::fetch::{build_client, check_url, fetch_page, measure_response_time, SizeResolver};
use crate::page::{self, base_url};
use crate::pagespeed::{PageSpeedClient, PerformanceSummary};
use crate::report::{PageReport, Rendering};

pub struct PageAnalyzer {
    config: AnalyzerConfig,
    client: Client,
    pagespeed: PageSpeedClient,
}

impl PageAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(&config.network)?;
        let pagespeed = PageSpeedClient::new(client.clone(), &config.pagespeed);

        Ok(Self {
            config,
            client,
            pagespeed,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    // Runs the full analysis of `url`
    //
    // Errors:
    //   MissingUrl / InvalidUrl - nothing was fetched
    //   PageFetch               - the page itself could not be retrieved
    //
    // Sub-resource and PageSpeed failures never surface here.
    pub async fn analyze(&self, url: &str, include_performance: bool) -> Result<PageReport> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AnalysisError::MissingUrl);
        }

        let target = self.validate_target(url).await?;
        let base = base_url(target.as_str())
            .ok_or_else(|| AnalysisError::InvalidUrl(url.to_string()))?;

        info!(url, "analyzing page");
        let body = fetch_page(&self.client, url).await?;

        let structure = page::inspect(&body, &base);
        debug!(
            url,
            resources = structure.resources.len(),
            dom_elements = structure.dom_elements,
            "page parsed"
        );

        let urls: Vec<String> = structure.resources.iter().map(|r| r.url.clone()).collect();
        let mut resolver = SizeResolver::new(self.client.clone(), &self.config.network);

        let (sizes, response_time, performance) = tokio::join!(
            resolver.resolve_sizes(&urls),
            self.response_time(url),
            self.performance(url, include_performance),
        );

        let report = PageReport::build(url, structure, &sizes, response_time, performance);
        info!(
            url,
            grade = %report.grade,
            score = report.score.total,
            requests = report.metrics.total_requests,
            bytes = report.metrics.total_bytes,
            "analysis complete"
        );

        Ok(report)
    }

    /// Like analyze, but always produces text: the report or the error message
    pub async fn check_page(
        &self,
        url: &str,
        include_performance: bool,
        rendering: Rendering,
    ) -> String {
        match self.analyze(url, include_performance).await {
            Ok(report) => report.render(rendering),
            Err(e) => e.to_string(),
        }
    }

    async fn validate_target(&self, url: &str) -> Result<Url> {
        if self.config.network.allow_private_networks {
            // Same syntax checks, no address policy
            return Url::parse(url)
                .ok()
                .filter(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                .ok_or_else(|| AnalysisError::InvalidUrl(url.to_string()));
        }

        check_url(url).await.map_err(|reason| {
            info!(url, %reason, "target rejected");
            AnalysisError::InvalidUrl(url.to_string())
        })
    }

    async fn response_time(&self, url: &str) -> Option<Duration> {
        if !self.config.network.measure_response_time {
            return None;
        }
        measure_response_time(&self.client, url).await
    }

    async fn performance(&self, url: &str, include: bool) -> Option<PerformanceSummary> {
        if !include {
            return None;
        }
        self.pagespeed.summary(url).await
    }
}

/// One-shot helper: build an analyzer from `config` and check a single page
pub async fn check_page(
    url: &str,
    include_performance: bool,
    config: AnalyzerConfig,
    rendering: Rendering,
) -> String {
    match PageAnalyzer::new(config) {
        Ok(analyzer) => analyzer.check_page(url, include_performance, rendering).await,
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::score::Grade;

    fn local_analyzer() -> PageAnalyzer {
        PageAnalyzer::new(AnalyzerConfig {
            network: NetworkConfig {
                allow_private_networks: true,
                measure_response_time: false,
                ..NetworkConfig::default()
            },
            ..AnalyzerConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_url() {
        let err = local_analyzer().analyze("   ", false).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingUrl));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_loopback_target_rejected_by_default() {
        let analyzer = PageAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let text = analyzer
            .check_page("http://127.0.0.1/", false, Rendering::Plain)
            .await;
        assert_eq!(text, "Error: Invalid or non-public URL provided.");
    }

    #[tokio::test]
    async fn test_full_run_against_local_server() {
        let mut server = mockito::Server::new_async().await;
        let page = r#"<html><head>
                <link rel="stylesheet" href="/style.css">
                <script src="app.js"></script>
            </head><body>
                <img src="/img/hero.png"><img src="/img/hero.png">
                <img src="/img/missing.png">
            </body></html>"#;
        let _page = server.mock("GET", "/").with_status(200).with_body(page).create_async().await;
        let _css = server
            .mock("GET", "/style.css")
            .with_status(200)
            .with_body("a".repeat(4096))
            .create_async()
            .await;
        let _js = server
            .mock("GET", "/app.js")
            .with_status(200)
            .with_body("b".repeat(1024))
            .create_async()
            .await;
        let hero = server
            .mock("GET", "/img/hero.png")
            .with_status(200)
            .with_body("c".repeat(8192))
            .expect(1)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/img/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let report = local_analyzer().analyze(&server.url(), false).await.unwrap();

        hero.assert_async().await;
        assert_eq!(report.metrics.total_requests, 5);
        assert_eq!(report.resources.len(), 4);
        assert_eq!(report.metrics.total_bytes, 4096 + 1024 + 8192);
        assert_eq!(report.category_totals.css, 4096);
        assert_eq!(report.category_totals.js, 1024);
        assert_eq!(report.category_totals.image, 8192);
        assert_eq!(report.resources[0].url, format!("{}/img/hero.png", server.url()));
        assert_eq!(report.grade, Grade::A);
        assert!(report.performance.is_none());
    }

    #[tokio::test]
    async fn test_page_fetch_error_is_reported_as_text() {
        let mut server = mockito::Server::new_async().await;
        let _down = server.mock("GET", "/down").with_status(503).create_async().await;

        let url = format!("{}/down", server.url());
        let text = local_analyzer().check_page(&url, false, Rendering::Plain).await;
        assert!(text.starts_with(&format!("Error retrieving resource size for {}:", url)));
    }

    #[tokio::test]
    async fn test_bare_page_report() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><head></head><body></body></html>")
            .create_async()
            .await;

        let text = local_analyzer()
            .check_page(&server.url(), false, Rendering::Html)
            .await;
        assert!(text.contains("Sobriety grade: A"));
        assert!(text.contains("text-green-400"));
        assert!(text.contains("Total weight by resource type:\n\n"));
    }
}
