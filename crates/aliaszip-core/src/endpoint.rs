//! Endpoint selection and URL construction.
//!
//! The configured endpoints form a pool of equivalent mirrors. Each phase of
//! a download draws from the pool independently via [`pick_endpoint`]; no
//! priority or stickiness is implied by the pool order.

use uuid::Uuid;

use crate::models::EndpointConfig;

/// Choose one endpoint uniformly at random, or `None` for an empty pool.
pub fn pick_endpoint(pool: &[EndpointConfig]) -> Option<&EndpointConfig> {
    if pool.is_empty() {
        return None;
    }
    // v4 UUIDs carry 122 random bits; modulo bias is negligible for any
    // realistic pool size.
    let idx = (Uuid::new_v4().as_u128() % pool.len() as u128) as usize;
    pool.get(idx)
}

/// Scheme + host of the endpoint, `https://` unless the host names a scheme.
pub fn origin(endpoint: &EndpointConfig) -> String {
    let host = endpoint.host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Base URL for requests to `endpoint`, prefixed with `proxy_origin` when the
/// endpoint opts into the proxy.
pub fn request_base(endpoint: &EndpointConfig, proxy_origin: &str) -> String {
    let origin = origin(endpoint);
    if endpoint.use_proxy {
        format!("{}/{}", proxy_origin.trim_end_matches('/'), origin)
    } else {
        origin
    }
}

/// `GET` URL of the directory-listing API for `path`.
///
/// The path is encoded as one component, so `/` becomes `%2F`.
pub fn contents_url(endpoint: &EndpointConfig, proxy_origin: &str, path: &str) -> String {
    format!(
        "{}/api/v1/repos/{}/{}/contents/{}",
        request_base(endpoint, proxy_origin),
        endpoint.owner,
        endpoint.repo,
        encode_component(path)
    )
}

/// `GET` URL of the raw bytes of `full_path` on branch `branch`.
pub fn raw_url(
    endpoint: &EndpointConfig,
    proxy_origin: &str,
    branch: &str,
    full_path: &str,
) -> String {
    format!(
        "{}/{}/{}/raw/branch/{}/{}",
        request_base(endpoint, proxy_origin),
        endpoint.owner,
        endpoint.repo,
        encode_component(branch),
        encode_path(full_path)
    )
}

/// Percent-encode everything outside the unreserved set (RFC 3986) plus the
/// characters `encodeURIComponent` leaves alone.
pub fn encode_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'~'
            | b'!'
            | b'*'
            | b'\''
            | b'('
            | b')' => result.push(byte as char),
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}

/// Encode each `/`-separated segment, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_component)
        .collect::<Vec<_>>()
        .join("/")
}
