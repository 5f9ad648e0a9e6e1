// src/fetch/client.rs
// =============================================================================
// HTTP client setup and the two requests made against the target itself:
// - fetch_page: the initial GET whose markup gets analyzed
// - measure_response_time: one extra timed GET, reported separately
//
// Unless private networks are allowed, every connection is address-checked:
// - hostnames go through PublicOnlyResolver, so the address reqwest connects
//   to is the one that was checked (redirect hops included)
// - IP literals never reach a resolver, so the redirect policy checks them
// =============================================================================

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{redirect, Client, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::lookup_host;
use tracing::{debug, warn};

use super::validate::{is_public_ip, UrlRejection};
use crate::config::NetworkConfig;
use crate::error::{AnalysisError, Result};

const MAX_REDIRECTS: usize = 10;

// Builds the single client shared by every request of an analyzer
//
// One client means one connection pool: resources on the same host reuse
// connections instead of opening a new one per request.
pub fn build_client(network: &NetworkConfig) -> Result<Client> {
    let allow_private = network.allow_private_networks;

    let policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        if !allow_private {
            let target_ip = attempt
                .url()
                .host_str()
                .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
                .and_then(|h| h.parse::<std::net::IpAddr>().ok());
            if let Some(ip) = target_ip {
                if !is_public_ip(ip) {
                    return attempt.error("redirect to non-public address blocked");
                }
            }
        }
        attempt.follow()
    });

    let mut builder = Client::builder()
        .user_agent(network.user_agent.as_str())
        .timeout(network.timeout())
        .connect_timeout(network.connect_timeout())
        .redirect(policy);
    if !allow_private {
        builder = builder.dns_resolver(Arc::new(PublicOnlyResolver));
    }

    builder.build().map_err(AnalysisError::HttpClient)
}

// DNS resolver that refuses names with any non-public address
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}

async fn resolve_public(
    host: String,
) -> std::result::Result<Addrs, Box<dyn std::error::Error + Send + Sync>> {
    // Port 0: the connector fills in the port of the request
    let addrs: Vec<SocketAddr> = lookup_host((host.as_str(), 0))
        .await
        .map_err(|_| UrlRejection::Unresolvable(host.clone()))?
        .collect();

    if addrs.is_empty() {
        return Err(UrlRejection::Unresolvable(host).into());
    }
    if let Some(addr) = addrs.iter().find(|addr| !is_public_ip(addr.ip())) {
        warn!(host = %host, ip = %addr.ip(), "connection to non-public address blocked");
        return Err(UrlRejection::NonPublic(addr.ip()).into());
    }

    Ok(Box::new(addrs.into_iter()))
}

// Fetches the page HTML
//
// Anything other than 200 OK aborts the run, so the error names the URL
// and what went wrong.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AnalysisError::page_fetch(url, describe_error(&e)))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AnalysisError::page_fetch(url, format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| AnalysisError::page_fetch(url, describe_error(&e)))
}

// Times a full GET of the target (headers and body)
//
// Returns None if the request fails; the report then just skips the line.
pub async fn measure_response_time(client: &Client, url: &str) -> Option<Duration> {
    let start = Instant::now();

    let result = async {
        let response = client.get(url).send().await?;
        response.bytes().await
    }
    .await;

    match result {
        Ok(_) => {
            let elapsed = start.elapsed();
            debug!(url, ?elapsed, "server response time measured");
            Some(elapsed)
        }
        Err(e) => {
            warn!(url, "response time measurement failed: {}", describe_error(&e));
            None
        }
    }
}

// Short human description of a reqwest error
pub(crate) fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        format!("Redirect refused: {}", error)
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_network() -> NetworkConfig {
        NetworkConfig {
            allow_private_networks: true,
            ..NetworkConfig::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_page_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><body>hi</body></html>")
            .create_async()
            .await;

        let client = build_client(&local_network()).unwrap();
        let body = fetch_page(&client, &server.url()).await.unwrap();
        assert!(body.contains("hi"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_non_200_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = build_client(&local_network()).unwrap();
        let url = format!("{}/missing", server.url());
        let err = fetch_page(&client, &url).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(&format!("Error retrieving resource size for {}", url)));
        assert!(message.contains("404"));
    }

    #[tokio::test]
    async fn test_redirect_to_loopback_blocked() {
        let mut server = mockito::Server::new_async().await;
        let _hop = server
            .mock("GET", "/hop")
            .with_status(302)
            .with_header("location", "http://127.0.0.1:1/secret")
            .create_async()
            .await;

        // The client does not vet the first request; only the hop is checked
        let client = build_client(&NetworkConfig::default()).unwrap();
        let url = format!("{}/hop", server.url());
        let err = client.get(&url).send().await.unwrap_err();
        assert!(err.is_redirect());
    }

    #[tokio::test]
    async fn test_redirect_to_private_hostname_blocked() {
        let mut server = mockito::Server::new_async().await;
        let port = server.host_with_port().rsplit(':').next().unwrap().to_string();
        let _hop = server
            .mock("GET", "/hop")
            .with_status(302)
            .with_header("location", &format!("http://localhost:{}/secret", port))
            .create_async()
            .await;
        let secret = server
            .mock("GET", "/secret")
            .with_status(200)
            .with_body("internal-only")
            .expect(0)
            .create_async()
            .await;

        let client = build_client(&NetworkConfig::default()).unwrap();
        let url = format!("{}/hop", server.url());
        let err = client.get(&url).send().await.unwrap_err();
        assert!(err.is_connect() || err.is_redirect(), "unexpected error: {}", err);
        secret.assert_async().await;
    }

    #[tokio::test]
    async fn test_private_hostname_blocked_at_resolve() {
        let addrs = resolve_public("localhost".to_string()).await;
        assert!(addrs.is_err());
    }

    #[tokio::test]
    async fn test_response_time_failure_is_none() {
        let client = build_client(&local_network()).unwrap();
        // Port 1 on loopback refuses connections
        assert!(measure_response_time(&client, "http://127.0.0.1:1/").await.is_none());
    }
}
