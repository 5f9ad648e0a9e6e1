// src/fetch/sizes.rs
// =============================================================================
// This module measures how many bytes each sub-resource weighs.
//
// Key functionality:
// - GETs every resource concurrently (bounded by max_concurrency)
// - A failed or non-200 fetch only affects that one resource
// - Remembers every outcome for the lifetime of the resolver, so a URL
//   referenced twice is requested once
// - Never fetches blob:/data:/other non-HTTP references, nor anything on a
//   host that fails the public-address check
//
// A SizeResolver is created per analysis run and dropped with it; nothing
// is shared between runs.
// =============================================================================

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use url::Url;

use super::validate::check_host;
use crate::config::NetworkConfig;

/// What happened when we tried to size a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SizeOutcome {
    /// 200 OK with a body of this many bytes (may legitimately be 0)
    Loaded { bytes: u64 },
    /// The request was made and did not produce a usable body
    Failed { reason: FetchFailure },
    /// No request was made
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    /// Any status other than 200
    Status(u16),
    Timeout,
    Connect,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// blob: URLs only exist inside a browser
    Blob,
    /// data:, mailto:, unparseable, ...
    UnsupportedScheme,
    /// The host resolves to a non-public address
    BlockedHost,
}

impl SizeOutcome {
    /// Byte count used for weights and sorting; anything not loaded counts as 0
    pub fn bytes(&self) -> u64 {
        match self {
            SizeOutcome::Loaded { bytes } => *bytes,
            _ => 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SizeOutcome::Loaded { .. })
    }
}

impl FetchFailure {
    fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_connect() {
            FetchFailure::Connect
        } else {
            FetchFailure::Other(error.to_string())
        }
    }
}

/// Run-scoped size fetcher with its own cache
pub struct SizeResolver {
    client: Client,
    max_concurrency: usize,
    allow_private_networks: bool,
    cache: HashMap<String, SizeOutcome>,
    requests_issued: usize,
}

impl SizeResolver {
    pub fn new(client: Client, network: &NetworkConfig) -> Self {
        Self {
            client,
            max_concurrency: network.max_concurrency.max(1),
            allow_private_networks: network.allow_private_networks,
            cache: HashMap::new(),
            requests_issued: 0,
        }
    }

    /// Outcome recorded earlier in this run, if any
    pub fn cached(&self, url: &str) -> Option<&SizeOutcome> {
        self.cache.get(url)
    }

    /// Number of network requests this resolver has made so far
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    // Resolves a size for every URL in `urls`
    //
    // Returns: map from each input URL to its outcome. Duplicates in the
    // input, and URLs resolved by an earlier call, are not fetched again.
    //
    // All fetches of the batch finish (or fail) before this returns.
    pub async fn resolve_sizes(&mut self, urls: &[String]) -> HashMap<String, SizeOutcome> {
        // Unique, not-yet-cached URLs, first occurrence wins
        let mut seen = HashSet::new();
        let pending: Vec<&String> = urls
            .iter()
            .filter(|url| !self.cache.contains_key(url.as_str()))
            .filter(|url| seen.insert(*url))
            .collect();

        let mut fetchable = Vec::new();
        for url in pending {
            match classify_reference(url) {
                Ok(parsed) => fetchable.push((url.clone(), parsed)),
                Err(reason) => {
                    debug!(url = %url, ?reason, "resource not fetched");
                    self.cache.insert(url.clone(), SizeOutcome::Skipped { reason });
                }
            }
        }

        let blocked = if self.allow_private_networks {
            HashSet::new()
        } else {
            blocked_hosts(fetchable.iter().map(|(_, parsed)| parsed)).await
        };

        let mut to_fetch = Vec::new();
        for (url, parsed) in fetchable {
            if blocked.contains(&host_key(&parsed)) {
                warn!(url = %url, "resource host is not public; skipping");
                self.cache.insert(
                    url,
                    SizeOutcome::Skipped {
                        reason: SkipReason::BlockedHost,
                    },
                );
            } else {
                to_fetch.push(url);
            }
        }

        self.requests_issued += to_fetch.len();

        let client = &self.client;
        let fetched: Vec<(String, SizeOutcome)> = stream::iter(to_fetch)
            .map(|url| async move {
                let outcome = fetch_size(client, &url).await;
                (url, outcome)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        self.cache.extend(fetched);

        urls.iter()
            .filter_map(|url| {
                self.cache
                    .get(url.as_str())
                    .map(|outcome| (url.clone(), outcome.clone()))
            })
            .collect()
    }
}

// Decides whether a reference can be fetched at all
fn classify_reference(url: &str) -> Result<Url, SkipReason> {
    if url.starts_with("blob:") {
        return Err(SkipReason::Blob);
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(parsed)
        }
        _ => Err(SkipReason::UnsupportedScheme),
    }
}

fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

// Runs the public-address check once per distinct host
async fn blocked_hosts<'a>(urls: impl Iterator<Item = &'a Url>) -> HashSet<String> {
    let mut hosts: HashMap<String, &Url> = HashMap::new();
    for url in urls {
        hosts.entry(host_key(url)).or_insert(url);
    }

    let verdicts = join_all(hosts.into_iter().map(|(key, url)| async move {
        let verdict = check_host(url).await;
        (key, verdict)
    }))
    .await;

    verdicts
        .into_iter()
        .filter_map(|(key, verdict)| match verdict {
            Ok(()) => None,
            Err(reason) => {
                debug!(host = %key, %reason, "host blocked");
                Some(key)
            }
        })
        .collect()
}

// GETs one resource and measures its body
async fn fetch_size(client: &Client, url: &str) -> SizeOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url, "resource fetch failed: {}", e);
            return SizeOutcome::Failed {
                reason: FetchFailure::from_error(&e),
            };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        debug!(url, %status, "resource returned non-200");
        return SizeOutcome::Failed {
            reason: FetchFailure::Status(status.as_u16()),
        };
    }

    match body_length(response).await {
        Ok(bytes) => {
            debug!(url, bytes, "resource sized");
            SizeOutcome::Loaded { bytes }
        }
        Err(e) => {
            debug!(url, "resource body failed: {}", e);
            SizeOutcome::Failed {
                reason: FetchFailure::from_error(&e),
            }
        }
    }
}

// Counts body bytes chunk by chunk; the body itself is never held whole
async fn body_length(mut response: Response) -> reqwest::Result<u64> {
    let mut total = 0u64;
    while let Some(chunk) = response.chunk().await? {
        total += chunk.len() as u64;
    }
    Ok(total)
}
