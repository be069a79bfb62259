//! SSRF (Server-Side Request Forgery) protection.
//!
//! Validates that a fetch target does not resolve to private, internal, or
//! reserved addresses. Resolution happens before the fetch, so a host that
//! changes its answers between the check and the request is not caught.
use std::io;
use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use scout_core::Error;
use url::{Host, Url};

/// Error type for SSRF validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsrfError {
    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

impl From<SsrfError> for Error {
    fn from(err: SsrfError) -> Self {
        match err {
            SsrfError::BlockedIp(ip) => Error::SsrfBlocked(format!("{ip} is a private or reserved address")),
            SsrfError::DnsError(msg) => Error::Network(format!("Failed to resolve target host: {msg}")),
        }
    }
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Link-local addresses (169.254/16, fe80::/10)
/// - Multicast addresses (224/4, ff00::/8)
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 forms of all of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(mapped));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that an IP address is not private or reserved.
pub fn validate_ip(ip: IpAddr) -> Result<(), SsrfError> {
    if is_private_or_reserved(ip) { Err(SsrfError::BlockedIp(ip)) } else { Ok(()) }
}

/// Hostname resolution used by the guard.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// The system resolver, through tokio's blocking `getaddrinfo` pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(tokio::net::lookup_host((host, port)).await?.collect())
    }
}

/// Resolve the target host and require every address to be public.
///
/// Carries no deadline of its own; callers bound it together with the fetch.
pub async fn guard_target(url: &Url, resolver: &dyn HostResolver) -> Result<(), SsrfError> {
    let host = url.host().ok_or_else(|| SsrfError::DnsError("missing host".into()))?;

    match host {
        Host::Ipv4(v4) => validate_ip(IpAddr::V4(v4)),
        Host::Ipv6(v6) => validate_ip(IpAddr::V6(v6)),
        Host::Domain(domain) => {
            let port = url.port_or_known_default().unwrap_or(443);
            let addrs =
                resolver.lookup(domain, port).await.map_err(|e| SsrfError::DnsError(format!("{domain}: {e}")))?;

            if addrs.is_empty() {
                return Err(SsrfError::DnsError(format!("{domain}: no addresses")));
            }
            for addr in &addrs {
                validate_ip(addr.ip())?;
            }

            tracing::debug!("{} resolved to {} public address(es)", domain, addrs.len());
            Ok(())
        }
    }
}
