// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// There is a single command: analyze one page. Flags given here override
// values from the optional --config file.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "page-footprint",
    version,
    about = "Measure a web page's resource footprint and grade its sobriety (A-G)",
    long_about = "page-footprint fetches a page, weighs every stylesheet, script, image, iframe \
                  and video it references, measures its DOM and gives it a sobriety grade from \
                  A (lightest) to G (heaviest)."
)]
pub struct Cli {
    /// URL of the page to analyze (e.g., https://example.com)
    ///
    /// Only public http/https targets are accepted.
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Add PageSpeed Insights scores (needs an API key)
    #[arg(short = 'a', long)]
    pub pagespeed: bool,

    /// PageSpeed Insights API key
    #[arg(long, env = "GOOGLE_PAGESPEED_API_KEY", hide_env_values = true)]
    pub pagespeed_key: Option<String>,

    /// Output the report with HTML markup (colored grade, linked resources)
    #[arg(long, conflicts_with = "json")]
    pub html: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Maximum number of resources fetched at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip the extra request that measures server response time
    #[arg(long)]
    pub no_response_time: bool,

    /// Enable verbose logging (to stderr)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["page-footprint", "-u", "https://example.com", "-a"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://example.com"));
        assert!(cli.pagespeed);
        assert!(!cli.html);
    }

    #[test]
    fn test_html_and_json_conflict() {
        let result = Cli::try_parse_from([
            "page-footprint",
            "--url",
            "https://example.com",
            "--html",
            "--json",
        ]);
        assert!(result.is_err());
    }
}
