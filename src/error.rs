// src/error.rs
// =============================================================================
// Error types for the analysis engine.
//
// Every failure that can stop a run lives here. Failures that are recovered
// locally (a single sub-resource timing out, a PageSpeed hiccup, malformed
// HTML) never become an AnalysisError; see fetch::SizeOutcome for those.
//
// The Display strings double as the user-facing messages, because both the
// CLI and a page renderer print them as-is.
// =============================================================================

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No target URL was supplied (or it was blank)
    #[error("Error: No URL provided.")]
    MissingUrl,

    /// The target failed validation (malformed, non-HTTP, private or reserved)
    #[error("Error: Invalid or non-public URL provided.")]
    InvalidUrl(String),

    /// The main page could not be retrieved
    #[error("Error retrieving resource size for {url}: {message}")]
    PageFetch { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("PageSpeed API error: {0}")]
    PerformanceApi(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Create a page fetch error
    pub fn page_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PageFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the run was refused before any page request was made
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl | Self::InvalidUrl(_) | Self::Config(_)
        )
    }
}
