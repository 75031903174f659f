//! Header propagation policy and loop detection.
//!
//! # Responsibilities
//! - Decide which inbound headers may cross to the outbound request
//! - Copy upstream response headers back to the caller unfiltered
//! - Build and detect the hop marker used to cut forwarding loops
//!
//! All operations here are pure and stateless; the allow-set is built once
//! at startup and only read afterwards.

use std::collections::HashSet;

use axum::http::{HeaderMap, HeaderName};

/// Protocol version literal carried in the hop marker.
const MARKER_PROTOCOL: &str = "1.1";

/// Header names permitted to cross inbound → outbound when no explicit
/// allow-set is configured.
pub const DEFAULT_ALLOWED: [&str; 4] = ["authorization", "content-type", "accept", "expect"];

/// Case-insensitive allow-set governing inbound → outbound header flow.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    /// Allowed names, stored lowercase.
    allowed: HashSet<String>,
}

impl HeaderPolicy {
    /// Build a policy from explicit header names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive membership test against the allow-set.
    pub fn is_allowed(&self, name: &HeaderName) -> bool {
        // HeaderName is already canonical lowercase.
        self.allowed.contains(name.as_str())
    }

    /// Append every value of every allowed header from `src` into `dst`.
    ///
    /// Values keep their original order, and entries already present in
    /// `dst` are never replaced.
    pub fn copy_allowed(&self, dst: &mut HeaderMap, src: &HeaderMap) {
        for (name, value) in src {
            if self.is_allowed(name) {
                dst.append(name.clone(), value.clone());
            }
        }
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED)
    }
}

/// Append every header from `src` into `dst`, unfiltered.
///
/// The response-relay path: upstream headers pass through untouched.
pub fn copy_all(dst: &mut HeaderMap, src: &HeaderMap) {
    for (name, value) in src {
        dst.append(name.clone(), value.clone());
    }
}

/// Whether any value of `name` equals `value`, ignoring ASCII case.
pub fn contains_marker(headers: &HeaderMap, name: &HeaderName, value: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .any(|candidate| {
            candidate
                .to_str()
                .is_ok_and(|candidate| candidate.eq_ignore_ascii_case(value))
        })
}

/// Hop-marker value identifying one gateway instance, e.g. `1.1 edge-01`.
pub fn marker_value(identity: &str) -> String {
    format!("{MARKER_PROTOCOL} {identity}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{ACCEPT, AUTHORIZATION, VIA};
    use axum::http::HeaderValue;

    #[test]
    fn default_allow_set() {
        let policy = HeaderPolicy::default();
        assert!(policy.is_allowed(&AUTHORIZATION));
        assert!(policy.is_allowed(&ACCEPT));
        assert!(policy.is_allowed(&HeaderName::from_static("content-type")));
        assert!(policy.is_allowed(&HeaderName::from_static("expect")));
        assert!(!policy.is_allowed(&HeaderName::from_static("x-secret")));
    }

    #[test]
    fn allow_set_is_case_insensitive() {
        let policy = HeaderPolicy::new(["X-Custom", "AUTHORIZATION"]);
        assert!(policy.is_allowed(&HeaderName::from_static("x-custom")));
        assert!(policy.is_allowed(&AUTHORIZATION));
        assert!(!policy.is_allowed(&ACCEPT));
    }

    #[test]
    fn copy_allowed_filters_and_preserves_order() {
        let policy = HeaderPolicy::default();

        let mut src = HeaderMap::new();
        src.append(ACCEPT, HeaderValue::from_static("text/html"));
        src.append(ACCEPT, HeaderValue::from_static("application/json"));
        src.append(
            HeaderName::from_static("x-secret"),
            HeaderValue::from_static("hunter2"),
        );

        let mut dst = HeaderMap::new();
        policy.copy_allowed(&mut dst, &src);

        let accepts: Vec<_> = dst.get_all(ACCEPT).iter().collect();
        assert_eq!(accepts, ["text/html", "application/json"]);
        assert!(!dst.contains_key("x-secret"));
    }

    #[test]
    fn copy_allowed_appends_without_replacing() {
        let policy = HeaderPolicy::default();

        let mut src = HeaderMap::new();
        src.append(ACCEPT, HeaderValue::from_static("text/plain"));

        let mut dst = HeaderMap::new();
        dst.append(ACCEPT, HeaderValue::from_static("text/html"));
        policy.copy_allowed(&mut dst, &src);

        let accepts: Vec<_> = dst.get_all(ACCEPT).iter().collect();
        assert_eq!(accepts, ["text/html", "text/plain"]);
    }

    #[test]
    fn copy_all_is_lossless() {
        let mut src = HeaderMap::new();
        src.append(ACCEPT, HeaderValue::from_static("text/html"));
        src.append(ACCEPT, HeaderValue::from_static("application/json"));
        src.append(
            HeaderName::from_static("x-anything"),
            HeaderValue::from_static("yes"),
        );

        let mut dst = HeaderMap::new();
        copy_all(&mut dst, &src);

        assert_eq!(dst.len(), src.len());
        assert_eq!(
            dst.get_all(ACCEPT).iter().collect::<Vec<_>>(),
            ["text/html", "application/json"]
        );
        assert_eq!(dst.get("x-anything").unwrap(), "yes");
    }

    #[test]
    fn marker_detection_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.append(VIA, HeaderValue::from_static("1.1 Edge-01"));

        assert!(contains_marker(&headers, &VIA, "1.1 edge-01"));
        assert!(!contains_marker(&headers, &VIA, "1.1 edge-02"));
    }

    #[test]
    fn marker_detection_scans_all_values() {
        let mut headers = HeaderMap::new();
        headers.append(VIA, HeaderValue::from_static("1.1 upstream-proxy"));
        headers.append(VIA, HeaderValue::from_static("1.1 edge-01"));

        assert!(contains_marker(&headers, &VIA, "1.1 edge-01"));
    }

    #[test]
    fn missing_header_is_not_a_marker() {
        let headers = HeaderMap::new();
        assert!(!contains_marker(&headers, &VIA, "1.1 edge-01"));
    }

    #[test]
    fn marker_value_format() {
        assert_eq!(marker_value("edge-01"), "1.1 edge-01");
    }
}
