// src/config.rs
// =============================================================================
// Configuration for an analysis run.
//
// Values come from (lowest to highest precedence):
//   1. the Default impls below
//   2. an optional TOML file (see AnalyzerConfig::from_toml_str)
//   3. environment / CLI flags, applied by main.rs
//
// Every struct uses #[serde(default)] so a config file only has to mention
// the keys it wants to change.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AnalysisError, Result};

/// Default PageSpeed Insights endpoint
pub const PAGESPEED_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0";

/// Main configuration for the analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub network: NetworkConfig,
    pub pagespeed: PageSpeedConfig,
}

/// Network behavior for the page fetch and the resource fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum number of sub-resource requests in flight at once
    pub max_concurrency: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Skip the public-address checks. Only meant for embedding code and tests
    /// that point the analyzer at a local server; a config file cannot set it.
    #[serde(skip)]
    pub allow_private_networks: bool,
    /// Time one extra GET of the target and report it as server response time
    pub measure_response_time: bool,
}

/// External performance-metrics collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSpeedConfig {
    /// API key. Without one the performance block is silently disabled.
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 120,
            max_concurrency: 16,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allow_private_networks: false,
            measure_response_time: true,
        }
    }
}

impl Default for PageSpeedConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: PAGESPEED_ENDPOINT.to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl PageSpeedConfig {
    /// The API key, if one is set and not blank
    pub fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl AnalyzerConfig {
    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AnalysisError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run fail or hang
    pub fn validate(&self) -> Result<()> {
        if self.network.max_concurrency == 0 {
            return Err(AnalysisError::config("max_concurrency must be at least 1"));
        }
        if self.network.timeout_secs == 0 {
            return Err(AnalysisError::config("timeout_secs must be at least 1"));
        }
        if self.network.connect_timeout_secs == 0 {
            return Err(AnalysisError::config(
                "connect_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}
