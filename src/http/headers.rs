//! Header filtering and outbound header construction.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Never relay Content-Length (bodies may change size; the transport
//!   recomputes it)
//! - Strip Content-Encoding on responses (the upstream client already
//!   decompressed the body; relaying the header would make callers
//!   decompress twice)
//! - Recompute Host from the resolved target unless host preservation is on
//! - Merge static custom headers, inject the translated credential, append
//!   the caller to X-Forwarded-For

use std::collections::HashMap;
use std::net::IpAddr;

use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::proxy::credentials;
use crate::proxy::target::{UpstreamTarget, TARGET_OVERRIDE_HEADER};

/// Headers meaningful for a single transport leg only; never relayed across
/// the proxy boundary in either direction.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

fn is_hop_by_hop(name: &HeaderName) -> bool {
    // HeaderName::as_str is always lowercase, so this match is
    // case-insensitive by construction.
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Filter inbound request headers for forwarding. Pure function.
pub fn filter_request_headers(headers: &HeaderMap, preserve_host: bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || name == &CONTENT_LENGTH {
            continue;
        }
        if name == &HOST && !preserve_host {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Filter upstream response headers for relaying to the caller. Pure function.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || name == &CONTENT_LENGTH || name == &CONTENT_ENCODING {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Build the complete outbound header set for one upstream request.
///
/// The per-request override headers are consumed here and never travel
/// upstream verbatim; the credential reaches the upstream only in translated
/// form. The credential is injected after the custom-header merge and wins a
/// name collision (the override models live per-request intent).
pub fn prepare_forward_headers(
    inbound: &HeaderMap,
    client_ip: Option<IpAddr>,
    target: &UpstreamTarget,
    credential: Option<&str>,
    custom_headers: &HashMap<String, String>,
    preserve_host: bool,
) -> HeaderMap {
    let mut out = filter_request_headers(inbound, preserve_host);

    out.remove(TARGET_OVERRIDE_HEADER);
    out.remove(credentials::CREDENTIAL_OVERRIDE_HEADER);

    if !preserve_host {
        if let Some(authority) = target.authority() {
            if let Ok(value) = HeaderValue::from_str(&authority) {
                out.insert(HOST, value);
            }
        }
    }

    for (name, value) in custom_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                out.insert(name, value);
            }
            _ => {
                tracing::warn!(header = %name, "skipping malformed custom header");
            }
        }
    }

    if let Some(credential) = credential {
        credentials::inject(&mut out, credential);
    }

    if let Some(ip) = client_ip {
        let chain = out
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ");
        let appended = if chain.is_empty() {
            ip.to_string()
        } else {
            format!("{}, {}", chain, ip)
        };
        if let Ok(value) = HeaderValue::from_str(&appended) {
            out.insert(X_FORWARDED_FOR, value);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("proxy.local:8000"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Transfer-Encoding", HeaderValue::from_static("chunked"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers
    }

    fn target() -> UpstreamTarget {
        UpstreamTarget::resolve(&HeaderMap::new(), "https://api.anthropic.com")
    }

    #[test]
    fn request_filter_strips_hop_by_hop_and_length() {
        let out = filter_request_headers(&inbound(), false);
        assert!(out.get("connection").is_none());
        assert!(out.get("transfer-encoding").is_none());
        assert!(out.get("content-length").is_none());
        assert!(out.get("host").is_none());
        assert_eq!(out.get("accept").unwrap(), "application/json");
        assert_eq!(out.get("anthropic-version").unwrap(), "2023-06-01");
    }

    #[test]
    fn request_filter_keeps_host_when_preserving() {
        let out = filter_request_headers(&inbound(), true);
        assert_eq!(out.get("host").unwrap(), "proxy.local:8000");
    }

    #[test]
    fn response_filter_strips_content_encoding() {
        let mut headers = HeaderMap::new();
        headers.insert("content-encoding", HeaderValue::from_static("gzip"));
        headers.insert("content-length", HeaderValue::from_static("10"));
        headers.insert("Keep-Alive", HeaderValue::from_static("timeout=5"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let out = filter_response_headers(&headers);
        assert!(out.get("content-encoding").is_none());
        assert!(out.get("content-length").is_none());
        assert!(out.get("keep-alive").is_none());
        assert_eq!(out.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn forward_headers_recompute_host() {
        let out = prepare_forward_headers(
            &inbound(),
            None,
            &target(),
            None,
            &HashMap::new(),
            false,
        );
        assert_eq!(out.get("host").unwrap(), "api.anthropic.com");
    }

    #[test]
    fn override_headers_are_consumed() {
        let mut headers = inbound();
        headers.insert(
            TARGET_OVERRIDE_HEADER,
            HeaderValue::from_static("https://other.example.com"),
        );
        headers.insert("x-api-key", HeaderValue::from_static("Bearer tok"));

        let out = prepare_forward_headers(
            &headers,
            None,
            &target(),
            Some("Bearer tok"),
            &HashMap::new(),
            false,
        );
        assert!(out.get(TARGET_OVERRIDE_HEADER).is_none());
        assert!(out.get("x-api-key").is_none(), "bearer credential must not leak as x-api-key");
        assert_eq!(out.get("authorization").unwrap(), "Bearer tok");
    }

    #[test]
    fn credential_wins_over_custom_header() {
        let mut custom = HashMap::new();
        custom.insert("x-api-key".to_string(), "static-key".to_string());

        let out = prepare_forward_headers(
            &inbound(),
            None,
            &target(),
            Some("sk-ant-live"),
            &custom,
            false,
        );
        assert_eq!(out.get("x-api-key").unwrap(), "sk-ant-live");
    }

    #[test]
    fn custom_headers_merge_without_credential() {
        let mut custom = HashMap::new();
        custom.insert("x-team".to_string(), "infra".to_string());

        let out =
            prepare_forward_headers(&inbound(), None, &target(), None, &custom, false);
        assert_eq!(out.get("x-team").unwrap(), "infra");
    }

    #[test]
    fn forwarded_for_appends_to_existing_chain() {
        let mut headers = inbound();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));

        let out = prepare_forward_headers(
            &headers,
            Some("192.168.1.7".parse().unwrap()),
            &target(),
            None,
            &HashMap::new(),
            false,
        );
        assert_eq!(out.get("x-forwarded-for").unwrap(), "10.0.0.1, 192.168.1.7");
    }
}
