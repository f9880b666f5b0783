//! Credential classification and injection.
//!
//! Callers hand the proxy a raw credential in the `X-API-Key` header. The
//! value is classified by prefix and injected into exactly one outbound
//! header: native Anthropic keys (and anything unrecognized) go out as
//! `x-api-key`, bearer tokens as `Authorization`.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Inbound header carrying the raw per-request credential.
pub const CREDENTIAL_OVERRIDE_HEADER: &str = "x-api-key";

/// Outbound header for native API keys.
pub const NATIVE_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

const NATIVE_KEY_PREFIX: &str = "sk-ant-";
const BEARER_PREFIX: &str = "Bearer ";

/// Classification of a raw credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    NativeKey,
    BearerToken,
    Unclassified,
}

/// Classify a credential value by prefix. Pure function.
pub fn classify(value: &str) -> CredentialKind {
    if value.starts_with(NATIVE_KEY_PREFIX) {
        CredentialKind::NativeKey
    } else if value.starts_with(BEARER_PREFIX) {
        CredentialKind::BearerToken
    } else {
        CredentialKind::Unclassified
    }
}

/// Read the raw credential override from the inbound headers.
pub fn read_override(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CREDENTIAL_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Inject a credential into the outbound header set.
pub fn inject(headers: &mut HeaderMap, value: &str) {
    let Ok(header_value) = HeaderValue::from_str(value) else {
        tracing::warn!("credential contains non-header-safe bytes, skipping injection");
        return;
    };

    match classify(value) {
        CredentialKind::BearerToken => {
            headers.insert(AUTHORIZATION, header_value);
        }
        CredentialKind::NativeKey | CredentialKind::Unclassified => {
            headers.insert(NATIVE_KEY_HEADER, header_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(classify("sk-ant-xxxx"), CredentialKind::NativeKey);
        assert_eq!(classify("Bearer abc"), CredentialKind::BearerToken);
        assert_eq!(classify("some-other-token"), CredentialKind::Unclassified);
        assert_eq!(classify(""), CredentialKind::Unclassified);
    }

    #[test]
    fn native_key_goes_to_x_api_key() {
        let mut headers = HeaderMap::new();
        inject(&mut headers, "sk-ant-xxxx");
        assert_eq!(headers.get("x-api-key").unwrap(), "sk-ant-xxxx");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn bearer_token_goes_to_authorization() {
        let mut headers = HeaderMap::new();
        inject(&mut headers, "Bearer abc");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(headers.get("x-api-key").is_none());
    }

    #[test]
    fn unclassified_defaults_to_x_api_key() {
        let mut headers = HeaderMap::new();
        inject(&mut headers, "legacy-token");
        assert_eq!(headers.get("x-api-key").unwrap(), "legacy-token");
    }
}
