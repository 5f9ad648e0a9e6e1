// src/fetch/validate.rs
// =============================================================================
// SSRF guard: decides whether a URL may be fetched at all.
//
// Checks, in order (all must pass):
//   1. the string parses as an absolute URL
//   2. the scheme is http or https
//   3. there is a host, and it resolves to at least one IP address
//   4. every resolved address is public: not loopback, private, link-local,
//      multicast, documentation, shared, benchmarking or otherwise reserved.
//      IPv6 forms that embed an IPv4 address are judged by that address
//
// IP literals are checked directly; names go through DNS. This runs before
// the first request of a run and before any sub-resource on a new host.
// =============================================================================

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use tokio::net::lookup_host;
use tracing::debug;
use url::{Host, Url};

/// Why a URL was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejection {
    #[error("not a valid absolute URL")]
    Malformed,
    #[error("unsupported scheme '{0}'")]
    Scheme(String),
    #[error("URL has no host")]
    NoHost,
    #[error("could not resolve host '{0}'")]
    Unresolvable(String),
    #[error("host resolves to non-public address {0}")]
    NonPublic(IpAddr),
}

/// True when `url` is safe to fetch (see check_url)
pub async fn validate_url(url: &str) -> bool {
    match check_url(url).await {
        Ok(_) => true,
        Err(reason) => {
            debug!(url, %reason, "URL rejected");
            false
        }
    }
}

/// Runs every check and hands back the parsed URL on success
pub async fn check_url(raw: &str) -> Result<Url, UrlRejection> {
    let url = Url::parse(raw.trim()).map_err(|_| UrlRejection::Malformed)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlRejection::Scheme(url.scheme().to_string()));
    }

    check_host(&url).await?;
    Ok(url)
}

/// Host-only part of the checks, for URLs that are already parsed
pub async fn check_host(url: &Url) -> Result<(), UrlRejection> {
    for ip in resolve_host(url).await? {
        if !is_public_ip(ip) {
            return Err(UrlRejection::NonPublic(ip));
        }
    }
    Ok(())
}

async fn resolve_host(url: &Url) -> Result<Vec<IpAddr>, UrlRejection> {
    match url.host() {
        Some(Host::Ipv4(ip)) => Ok(vec![IpAddr::V4(ip)]),
        Some(Host::Ipv6(ip)) => Ok(vec![IpAddr::V6(ip)]),
        Some(Host::Domain(domain)) => {
            if domain.is_empty() {
                return Err(UrlRejection::NoHost);
            }
            let port = url.port_or_known_default().unwrap_or(80);
            let addrs = lookup_host((domain, port))
                .await
                .map_err(|_| UrlRejection::Unresolvable(domain.to_string()))?;

            let ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
            if ips.is_empty() {
                Err(UrlRejection::Unresolvable(domain.to_string()))
            } else {
                Ok(ips)
            }
        }
        None => Err(UrlRejection::NoHost),
    }
}

/// True for globally routable unicast addresses
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();

    let reserved = ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        || a == 0                                  // "this network"
        || (a == 100 && (b & 0xc0) == 64)          // 100.64.0.0/10 shared
        || (a == 192 && b == 0 && c == 0)          // 192.0.0.0/24 IETF
        || (a == 198 && (b & 0xfe) == 18)          // 198.18.0.0/15 benchmarking
        || a >= 240; // 240.0.0.0/4 reserved

    !reserved
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = embedded_v4(ip) {
        return is_public_v4(v4);
    }

    let segments = ip.segments();
    let reserved = ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || (segments[0] & 0xfe00) == 0xfc00               // fc00::/7 unique local
        || (segments[0] & 0xffc0) == 0xfe80               // fe80::/10 link local
        || (segments[0] & 0xffc0) == 0xfec0               // fec0::/10 site local
        || segments[..4] == [0x0100, 0, 0, 0]             // 100::/64 discard
        || (segments[0] == 0x2001 && segments[1] < 0x0200) // 2001::/23 IETF
        || (segments[0] == 0x2001 && segments[1] == 0x0db8); // documentation

    !reserved
}

// IPv4 address carried inside an IPv6 one, for the forms that route to it
fn embedded_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    let s = ip.segments();
    let from_pair = |hi: u16, lo: u16| Ipv4Addr::from((u32::from(hi) << 16) | u32::from(lo));

    if let Some(v4) = ip.to_ipv4_mapped() {
        return Some(v4);
    }
    match s {
        // ::a.b.c.d (IPv4-compatible), but not :: or ::1
        [0, 0, 0, 0, 0, 0, hi, lo] if hi != 0 || lo > 1 => Some(from_pair(hi, lo)),
        // 64:ff9b::/96 NAT64
        [0x64, 0xff9b, 0, 0, 0, 0, hi, lo] => Some(from_pair(hi, lo)),
        // 2002::/16 6to4
        [0x2002, hi, lo, ..] => Some(from_pair(hi, lo)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_rejected() {
        assert!(!validate_url("http://127.0.0.1/").await);
        assert!(!validate_url("http://[::1]/").await);
        assert!(!validate_url("http://localhost:8080/").await);
    }

    #[tokio::test]
    async fn test_private_and_link_local_rejected() {
        assert!(!validate_url("http://10.0.0.8/").await);
        assert!(!validate_url("http://192.168.1.1/admin").await);
        assert!(!validate_url("http://172.16.5.4/").await);
        assert!(!validate_url("http://169.254.169.254/latest/meta-data").await);
        assert!(!validate_url("http://[fe80::1]/").await);
        assert!(!validate_url("http://[::ffff:127.0.0.1]/").await);
    }

    #[tokio::test]
    async fn test_malformed_and_wrong_scheme_rejected() {
        assert_eq!(check_url("not a url").await, Err(UrlRejection::Malformed));
        assert_eq!(check_url("/relative/path").await, Err(UrlRejection::Malformed));
        assert_eq!(
            check_url("ftp://8.8.8.8/file").await,
            Err(UrlRejection::Scheme("ftp".to_string()))
        );
        assert!(!validate_url("javascript:alert(1)").await);
    }

    #[tokio::test]
    async fn test_public_ip_literal_accepted() {
        assert!(validate_url("https://8.8.8.8/").await);
        assert!(validate_url("http://[2606:4700:4700::1111]/").await);
    }

    #[tokio::test]
    #[ignore] // Requires DNS
    async fn test_public_domain_accepted() {
        assert!(validate_url("https://example.com/").await);
    }

    #[test]
    fn test_reserved_ranges() {
        let blocked = [
            "0.1.2.3",
            "100.64.0.1",
            "192.0.0.5",
            "192.0.2.1",
            "198.18.0.1",
            "203.0.113.9",
            "224.0.0.1",
            "240.0.0.1",
            "255.255.255.255",
            "fd00::1",
            "ff02::1",
            "2001:db8::1",
            "::",
            "::1",
            "::127.0.0.1",
            "::10.0.0.1",
            "64:ff9b::a00:1",
            "2002:7f00:1::",
            "2002:c0a8:101::1",
            "fec0::1",
            "100::1",
            "2001::1",
            "2001:1ff::1",
        ];
        for ip in blocked {
            assert!(!is_public_ip(ip.parse().unwrap()), "{} should be blocked", ip);
        }

        assert!(is_public_ip("93.184.216.34".parse().unwrap()));
        assert!(is_public_ip("::ffff:93.184.216.34".parse().unwrap()));
        assert!(is_public_ip("64:ff9b::5db8:d822".parse().unwrap()));
        assert!(is_public_ip("2002:5db8:d822::1".parse().unwrap()));
        assert!(is_public_ip("2001:4860:4860::8888".parse().unwrap()));
    }
}
