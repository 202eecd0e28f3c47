//! Header handling at the proxy boundary.
//!
//! Strips hop-by-hop and proxy-internal headers in both directions and
//! stamps edge identification on outbound requests.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::config::EdgeIdentity;

/// Cache-status marker, always `HIT` or `MISS` on responses.
pub const CACHE_STATUS_HEADER: &str = "x-cache";
/// Identity of the edge that served or forwarded a request.
pub const EDGE_SERVER_HEADER: &str = "x-edge-server";
/// Region of the edge that served or forwarded a request.
pub const EDGE_REGION_HEADER: &str = "x-edge-region";
/// Client address chain forwarded to origin.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Connection-scoped headers (RFC 9110 section 7.6.1) that never cross a proxy.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Returns true if `name` is a standard hop-by-hop header.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Extra header names a message lists in its own `Connection` header.
fn connection_listed(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Builds the header set sent to origin.
///
/// Drops hop-by-hop headers, `host`, `content-length` and any cache-status
/// marker from a previous hop, then adds edge identification and appends
/// `client_addr` to the forwarded-for chain.
pub fn outbound_headers(
    inbound: &HeaderMap,
    identity: &EdgeIdentity,
    client_addr: Option<&str>,
) -> HeaderMap {
    let listed = connection_listed(inbound);
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 3);

    for (name, value) in inbound {
        let skip = is_hop_by_hop(name)
            || *name == header::HOST
            || *name == header::CONTENT_LENGTH
            || name.as_str() == CACHE_STATUS_HEADER
            || name.as_str() == FORWARDED_FOR_HEADER
            || listed.iter().any(|token| token == name.as_str());
        if !skip {
            outbound.append(name.clone(), value.clone());
        }
    }

    insert_str(&mut outbound, EDGE_SERVER_HEADER, &identity.id);
    insert_str(&mut outbound, EDGE_REGION_HEADER, &identity.region);

    let prior: Vec<&str> = inbound
        .get_all(FORWARDED_FOR_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    let mut chain = prior.join(", ");
    if let Some(addr) = client_addr {
        if !chain.is_empty() {
            chain.push_str(", ");
        }
        chain.push_str(addr);
    }
    if !chain.is_empty() {
        insert_str(&mut outbound, FORWARDED_FOR_HEADER, &chain);
    }

    outbound
}

/// Collapses origin response headers to their first value, in order.
///
/// Hop-by-hop headers are dropped. `content-length` is dropped too unless
/// `keep_content_length` is set: a GET body's length is recomputed when the
/// response is written, but a HEAD response has no body to measure and must
/// carry the origin's value. Values that are not valid UTF-8 are skipped.
pub fn collapse_response_headers(
    headers: &HeaderMap,
    keep_content_length: bool,
) -> Vec<(String, String)> {
    let listed = connection_listed(headers);

    headers
        .keys()
        .filter(|name| {
            !is_hop_by_hop(name)
                && (keep_content_length || **name != header::CONTENT_LENGTH)
                && !listed.iter().any(|token| token == name.as_str())
        })
        .filter_map(|name| {
            let value = headers.get(name)?.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn insert_str(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => debug!(header = name, "Skipping header with invalid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> EdgeIdentity {
        EdgeIdentity::new("edge-1", "eu-west-1")
    }

    #[test]
    fn test_outbound_strips_internal_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-cache", HeaderValue::from_static("HIT"));
        inbound.insert("connection", HeaderValue::from_static("keep-alive, x-trace"));
        inbound.insert("x-trace", HeaderValue::from_static("abc"));
        inbound.insert("host", HeaderValue::from_static("edge.example.com"));
        inbound.insert("accept", HeaderValue::from_static("text/html"));

        let outbound = outbound_headers(&inbound, &identity(), Some("198.51.100.4"));

        assert!(outbound.get("x-cache").is_none());
        assert!(outbound.get("connection").is_none());
        assert!(outbound.get("x-trace").is_none());
        assert!(outbound.get("host").is_none());
        assert_eq!(outbound.get("accept").unwrap(), "text/html");
        assert_eq!(outbound.get(EDGE_SERVER_HEADER).unwrap(), "edge-1");
        assert_eq!(outbound.get(EDGE_REGION_HEADER).unwrap(), "eu-west-1");
        assert_eq!(outbound.get(FORWARDED_FOR_HEADER).unwrap(), "198.51.100.4");
    }

    #[test]
    fn test_outbound_overwrites_spoofed_identity() {
        let mut inbound = HeaderMap::new();
        inbound.insert(EDGE_SERVER_HEADER, HeaderValue::from_static("impostor"));

        let outbound = outbound_headers(&inbound, &identity(), None);
        assert_eq!(outbound.get_all(EDGE_SERVER_HEADER).iter().count(), 1);
        assert_eq!(outbound.get(EDGE_SERVER_HEADER).unwrap(), "edge-1");
        assert!(outbound.get(FORWARDED_FOR_HEADER).is_none());
    }

    #[test]
    fn test_forwarded_for_chain_is_appended() {
        let mut inbound = HeaderMap::new();
        inbound.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static("203.0.113.1"));

        let outbound = outbound_headers(&inbound, &identity(), Some("10.0.0.9"));
        assert_eq!(
            outbound.get(FORWARDED_FOR_HEADER).unwrap(),
            "203.0.113.1, 10.0.0.9"
        );
    }

    #[test]
    fn test_collapse_keeps_first_value_in_order() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("image/png"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("etag", HeaderValue::from_static("\"v1\""));

        let collapsed = collapse_response_headers(&headers, false);

        assert_eq!(
            collapsed,
            vec![
                ("content-type".to_string(), "image/png".to_string()),
                ("set-cookie".to_string(), "a=1".to_string()),
                ("etag".to_string(), "\"v1\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_collapse_keeps_content_length_for_head() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("video/mp4"));
        headers.insert("content-length", HeaderValue::from_static("1048576"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));

        let collapsed = collapse_response_headers(&headers, true);

        assert_eq!(
            collapsed,
            vec![
                ("content-type".to_string(), "video/mp4".to_string()),
                ("content-length".to_string(), "1048576".to_string()),
            ]
        );
    }
}
