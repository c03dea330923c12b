//! Client identification utilities
//!
//! Common functions for reading the proxy-populated request headers that
//! identify the caller: real IP, originating domain, device string, and the
//! correlation id used to tie log lines of one request together.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;
use uuid::Uuid;

/// Header set by the reverse proxy with the caller's address
pub const X_REAL_IP: &str = "x-real-ip";

/// Header set by the reverse proxy with the public origin the caller used
pub const X_REAL_ORIGIN: &str = "x-real-origin";

/// Correlation id header
pub const X_REQUEST_ID: &str = "x-request-id";

/// Transport metadata of one request
///
/// Every field is optional: the proxy may not forward a header, and the
/// handlers pass whatever is present through to the collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    /// Client IP address (`x-real-ip`, `x-forwarded-for`, or the socket)
    pub ip: Option<String>,
    /// Public domain the request came through (`x-real-origin`)
    pub domain: Option<String>,
    /// Raw `User-Agent`
    pub user_agent: Option<String>,
    /// `Origin` header
    pub origin: Option<String>,
    /// `Referer` header
    pub referer: Option<String>,
}

/// Extract client metadata from request headers
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Address of the TCP peer, if known
pub fn extract_client_meta(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> ClientMeta {
    ClientMeta {
        ip: extract_client_ip(headers, direct_ip),
        domain: header_str(headers, X_REAL_ORIGIN),
        user_agent: header_str(headers, header::USER_AGENT.as_str()),
        origin: header_str(headers, header::ORIGIN.as_str()),
        referer: header_str(headers, header::REFERER.as_str()),
    }
}

/// Extract client IP address from headers
///
/// Checks `x-real-ip` first, then the first entry of `x-forwarded-for`,
/// then falls back to the direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<String> {
    if let Some(real_ip) = header_str(headers, X_REAL_IP) {
        return Some(real_ip);
    }

    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip.to_string());
            }
        }
    }

    direct_ip.map(|ip| ip.to_string())
}

/// Read the correlation id, or mint a new one
///
/// A client-supplied `x-request-id` is only honoured when it is a UUID, so
/// arbitrary text never reaches the log fields.
pub fn extract_request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
