// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr) and build the configuration
// 3. Analyze the page and print the report to stdout
// 4. Exit with proper code:
//      0 = report printed
//      1 = missing/invalid URL or bad configuration
//      2 = the page itself could not be fetched
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use page_footprint::{AnalyzerConfig, PageAnalyzer, PageReport, Rendering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli)?;

    let Some(url) = cli.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        println!("Usage: page-footprint --url <URL> [--pagespeed]");
        return Ok(1);
    };

    let analyzer = PageAnalyzer::new(config)?;

    match analyzer.analyze(url, cli.pagespeed).await {
        Ok(report) => {
            print_report(&report, &cli)?;
            Ok(0)
        }
        Err(e) => {
            // Errors are part of the output, like a report would be
            println!("{}", e);
            Ok(if e.is_input_error() { 1 } else { 2 })
        }
    }
}

// Defaults, then the config file, then environment/flags
fn load_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            AnalyzerConfig::from_toml_str(&text)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => AnalyzerConfig::default(),
    };

    if let Some(key) = &cli.pagespeed_key {
        config.pagespeed.api_key = Some(key.clone());
    }
    if let Some(concurrency) = cli.concurrency {
        config.network.max_concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        config.network.timeout_secs = timeout;
    }
    if cli.no_response_time {
        config.network.measure_response_time = false;
    }

    config.validate()?;
    Ok(config)
}

fn print_report(report: &PageReport, cli: &Cli) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let rendering = if cli.html {
            Rendering::Html
        } else {
            Rendering::Plain
        };
        print!("{}", report.render(rendering));
    }
    Ok(())
}

// Logs go to stderr so stdout only ever carries the report
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("page_footprint=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
