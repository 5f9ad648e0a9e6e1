// src/report/mod.rs
// =============================================================================
// The structured result of one analysis run, and its renderings.
//
// PageReport holds everything a caller may want to display: metrics, score,
// grade, per-category weights and the size-sorted resource list. It is
// rendering-agnostic; render.rs turns it into plain text (CLI) or lightly
// marked-up HTML text, and main.rs can also serialize it as JSON.
//
// Counting rules:
// - total_requests counts every reference found in the markup
// - weights and the resource list count each distinct URL once, in the
//   order it was first discovered
// =============================================================================

mod render;

pub use render::{escape_html, format_number, render};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::fetch::{FetchFailure, SizeOutcome};
use crate::page::{PageStructure, SourceTag};
use crate::pagespeed::PerformanceSummary;
use crate::score::{aggregate, classify, score, CategoryTotals, Grade, ResourceCategory, Score};

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1_048_576.0;

/// Which flavor of text to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rendering {
    /// Plain text for terminals
    #[default]
    Plain,
    /// Text with a colored grade span and anchor-wrapped resources
    Html,
}

/// One distinct resource and what we learned about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub url: String,
    pub source: SourceTag,
    pub category: ResourceCategory,
    pub outcome: SizeOutcome,
}

impl ResourceEntry {
    pub fn bytes(&self) -> u64 {
        self.outcome.bytes()
    }
}

/// Structural and weight measurements of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub dom_elements: usize,
    pub max_depth: usize,
    pub total_requests: usize,
    pub total_bytes: u64,
}

impl PageMetrics {
    pub fn total_weight_mb(&self) -> f64 {
        bytes_to_mb(self.total_bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub metrics: PageMetrics,
    pub score: Score,
    pub grade: Grade,
    pub category_totals: CategoryTotals,
    /// Sorted heaviest first; equal sizes keep discovery order
    pub resources: Vec<ResourceEntry>,
    pub server_response_time_secs: Option<f64>,
    pub performance: Option<PerformanceSummary>,
}

impl PageReport {
    /// Assembles a report from the parsed page and the resolved sizes
    pub fn build(
        url: &str,
        structure: PageStructure,
        sizes: &HashMap<String, SizeOutcome>,
        server_response_time: Option<Duration>,
        performance: Option<PerformanceSummary>,
    ) -> Self {
        let total_requests = structure.resources.len();

        let mut seen = HashSet::new();
        let mut resources: Vec<ResourceEntry> = structure
            .resources
            .into_iter()
            .filter(|r| seen.insert(r.url.clone()))
            .map(|r| {
                let outcome = sizes.get(&r.url).cloned().unwrap_or(SizeOutcome::Failed {
                    reason: FetchFailure::Other("size not resolved".to_string()),
                });
                ResourceEntry {
                    category: classify(&r.url),
                    url: r.url,
                    source: r.source,
                    outcome,
                }
            })
            .collect();

        let total_bytes = resources.iter().map(ResourceEntry::bytes).sum();
        let category_totals =
            aggregate(resources.iter().map(|r| (r.url.as_str(), r.bytes())));

        // sort_by is stable: ties keep discovery order
        resources.sort_by(|a, b| b.bytes().cmp(&a.bytes()));

        let metrics = PageMetrics {
            dom_elements: structure.dom_elements,
            max_depth: structure.max_depth,
            total_requests,
            total_bytes,
        };
        let score = score(
            metrics.dom_elements,
            metrics.total_weight_mb(),
            metrics.total_requests,
        );

        PageReport {
            url: url.to_string(),
            metrics,
            grade: Grade::from_score(score.total),
            score,
            category_totals,
            resources,
            server_response_time_secs: server_response_time.map(|d| d.as_secs_f64()),
            performance,
        }
    }

    pub fn render(&self, rendering: Rendering) -> String {
        render(self, rendering)
    }
}

pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_KB
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{inspect, ResourceRef};

    fn loaded(bytes: u64) -> SizeOutcome {
        SizeOutcome::Loaded { bytes }
    }

    fn reference(url: &str, source: SourceTag) -> ResourceRef {
        ResourceRef {
            url: url.to_string(),
            source,
        }
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let structure = PageStructure {
            resources: vec![
                reference("https://s.com/a.css", SourceTag::Link),
                reference("https://s.com/b.js", SourceTag::Script),
                reference("https://s.com/c.png", SourceTag::Img),
                reference("https://s.com/d.png", SourceTag::Img),
            ],
            dom_elements: 10,
            max_depth: 3,
        };
        let sizes = HashMap::from([
            ("https://s.com/a.css".to_string(), loaded(10)),
            ("https://s.com/b.js".to_string(), loaded(500)),
            ("https://s.com/c.png".to_string(), loaded(10)),
            ("https://s.com/d.png".to_string(), loaded(10)),
        ]);

        let report = PageReport::build("https://s.com", structure, &sizes, None, None);
        let order: Vec<&str> = report.resources.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "https://s.com/b.js",
                "https://s.com/a.css",
                "https://s.com/c.png",
                "https://s.com/d.png"
            ]
        );
    }

    #[test]
    fn test_duplicates_counted_as_requests_but_weighed_once() {
        let structure = PageStructure {
            resources: vec![
                reference("https://s.com/a.js", SourceTag::Script),
                reference("https://s.com/a.js", SourceTag::Script),
                reference("https://s.com/font.woff2", SourceTag::Link),
            ],
            dom_elements: 5,
            max_depth: 2,
        };
        let sizes = HashMap::from([
            ("https://s.com/a.js".to_string(), loaded(2048)),
            ("https://s.com/font.woff2".to_string(), loaded(1024)),
        ]);

        let report = PageReport::build("https://s.com", structure, &sizes, None, None);
        assert_eq!(report.metrics.total_requests, 3);
        assert_eq!(report.resources.len(), 2);
        assert_eq!(report.metrics.total_bytes, 3072);
        assert_eq!(report.category_totals.js, 2048);
        // Uncategorized weight counts toward the total only
        assert!(report.category_totals.categorized_total() <= report.metrics.total_bytes);
    }

    #[test]
    fn test_empty_page_grades_a() {
        let structure = inspect("", "https://s.com");
        let report = PageReport::build("https://s.com", structure, &HashMap::new(), None, None);

        assert_eq!(report.grade, Grade::A);
        assert!(report.resources.is_empty());
        assert!(report.category_totals.non_zero().is_empty());
        assert_eq!(report.metrics.total_requests, 0);
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(bytes_to_kb(2048), 2.0);
        assert_eq!(bytes_to_mb(1_048_576 * 3), 3.0);
    }
}
