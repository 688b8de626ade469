//! Outbound URL checks for remote ingestion
//!
//! Remote ingestion fetches whatever URL a user sends, so before connecting we refuse:
//! - schemes other than http/https
//! - hosts outside the configured allowlist, when one is set
//! - loopback, private, link-local and otherwise internal addresses, both literal and
//!   after DNS resolution (unless private URLs are explicitly allowed)

use reqwest::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio::net::lookup_host;

/// Validate a remote source URL. The error string is safe to show to the user.
pub async fn check_source_url(
    url: &Url,
    allow_private: bool,
    allowlist: Option<&[String]>,
) -> Result<(), String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err("URL must start with http:// or https://".to_string());
    }

    let host_name = url
        .host_str()
        .ok_or_else(|| "URL must have a host".to_string())?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_lowercase();

    if let Some(allowed_domains) = allowlist {
        let is_allowed = allowed_domains.iter().any(|allowed| {
            let allowed = allowed.to_lowercase();
            host_name == allowed || host_name.ends_with(&format!(".{}", allowed))
        });
        if !is_allowed {
            return Err(format!(
                "URL hostname '{}' is not in the allowed list",
                host_name
            ));
        }
    }

    if allow_private {
        return Ok(());
    }

    if let Ok(ip) = host_name.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err("Private/internal IP addresses are not allowed".to_string());
        }
    } else if is_internal_hostname(&host_name) {
        return Err("Localhost and internal hostnames are not allowed".to_string());
    }

    let port = url.port_or_known_default().unwrap_or(80);
    match lookup_host((host_name.as_str(), port)).await {
        Ok(addrs) => {
            for addr in addrs {
                if is_private_ip(&addr.ip()) {
                    return Err(format!(
                        "Hostname resolves to private/internal IP address: {}",
                        addr.ip()
                    ));
                }
            }
        }
        Err(e) => {
            // The fetch itself will fail and report a connection error.
            tracing::warn!(host = %host_name, error = %e, "Failed to resolve hostname for URL check");
        }
    }

    Ok(())
}

fn is_internal_hostname(host: &str) -> bool {
    host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".corp")
}

/// True for loopback, private, link-local, multicast, unspecified and unique-local ranges.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(ipv4),
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ipv4(&mapped);
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || octets[0] == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
}

/// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

/// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check(raw: &str, allow_private: bool, allowlist: Option<&[String]>) -> Result<(), String> {
        check_source_url(&Url::parse(raw).unwrap(), allow_private, allowlist).await
    }

    #[tokio::test]
    async fn test_rejects_loopback_and_private_literals() {
        for raw in [
            "http://127.0.0.1/video.mp4",
            "http://[::1]/video.mp4",
            "http://10.0.0.1/video.mp4",
            "http://172.16.0.1/video.mp4",
            "http://192.168.1.1/video.mp4",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/video.mp4",
            "http://[::ffff:127.0.0.1]/video.mp4",
        ] {
            assert!(check(raw, false, None).await.is_err(), "{} accepted", raw);
        }
    }

    #[tokio::test]
    async fn test_rejects_internal_hostnames() {
        for raw in [
            "http://localhost:8080/video.mp4",
            "http://media.local/video.mp4",
            "http://service.internal/video.mp4",
            "http://service.corp/video.mp4",
        ] {
            assert!(check(raw, false, None).await.is_err(), "{} accepted", raw);
        }
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        assert!(check("ftp://example.com/video.mp4", true, None).await.is_err());
        assert!(check("file:///etc/passwd", true, None).await.is_err());
    }

    #[tokio::test]
    async fn test_allow_private_permits_loopback() {
        assert!(check("http://127.0.0.1:3000/video.mp4", true, None).await.is_ok());
        assert!(check("http://localhost/video.mp4", true, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_allowlist_matches_domain_and_subdomains() {
        let allowlist = vec!["example.com".to_string()];

        assert!(check("https://example.com/a.mp4", true, Some(allowlist.as_slice())).await.is_ok());
        assert!(check("https://cdn.example.com/a.mp4", true, Some(allowlist.as_slice())).await.is_ok());
        assert!(check("https://badexample.com/a.mp4", true, Some(allowlist.as_slice())).await.is_err());
        assert!(check("https://evil.com/a.mp4", true, Some(allowlist.as_slice())).await.is_err());
    }

    #[test]
    fn test_is_private_ip() {
        assert!(is_private_ip(&IpAddr::V4(Ipv4Addr::new(100, 64, 0, 1))));
        assert!(is_private_ip(&IpAddr::V6("fd00::1".parse().unwrap())));
        assert!(is_private_ip(&IpAddr::V6("fe80::1".parse().unwrap())));

        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))));
        assert!(!is_private_ip(&IpAddr::V4(Ipv4Addr::new(100, 128, 0, 1))));
        assert!(!is_private_ip(&IpAddr::V6("2606:4700::1111".parse().unwrap())));
    }
}
