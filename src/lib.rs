// src/lib.rs
// =============================================================================
// page-footprint: measures a web page's resource footprint and grades it.
//
// The engine fetches one page, finds the stylesheets, scripts, images,
// iframes and videos it references, weighs each of them, measures the DOM
// and turns it all into an A-G sobriety grade.
//
// Modules:
// - page:      markup-only work (resource extraction, DOM metrics)
// - fetch:     URL validation, page fetch, concurrent resource sizing
// - score:     categorization, weight totals, scoring and grade
// - pagespeed: optional PageSpeed Insights metrics
// - report:    structured result and its text renderings
// - analyzer:  ties everything together
//
// The CLI in main.rs is one caller; anything else that wants a report
// (a web form handler, a batch job) goes through PageAnalyzer too.
// =============================================================================

pub mod analyzer;
pub mod config;
pub mod error;
pub mod fetch;
pub mod page;
pub mod pagespeed;
pub mod report;
pub mod score;

pub use analyzer::{check_page, PageAnalyzer};
pub use config::{AnalyzerConfig, NetworkConfig, PageSpeedConfig};
pub use error::{AnalysisError, Result};
pub use report::{PageMetrics, PageReport, Rendering, ResourceEntry};
pub use score::Grade;
