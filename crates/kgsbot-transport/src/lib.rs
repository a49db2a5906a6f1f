//! Transport abstraction layer for kgsbot.
//!
//! Provides the [`HttpTransport`] trait: the GET/POST primitive the session
//! layer talks to the servlet through. The protocol and session layers never
//! touch sockets directly; they hand a URL, some parameters or a body, and
//! the session cookies to a transport and get an [`HttpResponse`] back.
//!
//! # Feature Flags
//!
//! - `http` (default): [`ReqwestTransport`], backed by `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{ReqwestTransport, DEFAULT_REQUEST_TIMEOUT};

use std::collections::BTreeMap;

/// Cookies exchanged with the servlet, keyed by cookie name.
///
/// A `BTreeMap` keeps the `Cookie` header deterministic (sorted by name),
/// which makes requests easy to assert on in tests.
pub type Cookies = BTreeMap<String, String>;

/// What came back from one HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Cookies the server set on this response.
    pub cookies: Cookies,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with the given status and body and no cookies.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            cookies: Cookies::new(),
            body: body.into(),
        }
    }

    /// Adds a cookie. Handy for building scripted responses.
    pub fn with_cookie(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The GET/POST primitive used to reach the servlet.
///
/// Implementations own connection pooling, TLS and timeouts. A timeout
/// surfaces as an `Err` like any other transport failure.
pub trait HttpTransport: Send + Sync + 'static {
    /// Issues a GET against `url` with `params` query-encoded.
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        cookies: Option<&Cookies>,
    ) -> Result<HttpResponse, TransportError>;

    /// Issues a POST against `url` with a raw body and extra headers.
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
        cookies: Option<&Cookies>,
    ) -> Result<HttpResponse, TransportError>;
}

/// Renders cookies as a single `Cookie` request header value.
///
/// Returns `None` when there is nothing to send.
pub fn cookie_header(cookies: &Cookies) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let pairs: Vec<String> =
        cookies.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Some(pairs.join("; "))
}

/// Extracts the `name=value` pair from a `Set-Cookie` header value.
///
/// Attributes after the first `;` (Path, HttpOnly, Expires...) are dropped.
/// Returns `None` for a header with no `=` or an empty name.
pub fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_response_is_success_for_2xx_only() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn test_with_cookie_collects_cookies() {
        let resp = HttpResponse::new(200, "").with_cookie("sid", "abc");
        assert_eq!(resp.cookies.get("sid").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_cookie_header_empty_is_none() {
        assert_eq!(cookie_header(&Cookies::new()), None);
    }

    #[test]
    fn test_cookie_header_joins_sorted_pairs() {
        let mut cookies = Cookies::new();
        cookies.insert("sid".into(), "abc".into());
        cookies.insert("JSESSIONID".into(), "42".into());
        assert_eq!(
            cookie_header(&cookies).as_deref(),
            Some("JSESSIONID=42; sid=abc")
        );
    }

    #[test]
    fn test_parse_set_cookie_strips_attributes() {
        let parsed = parse_set_cookie("JSESSIONID=F00D; Path=/jsonClient; HttpOnly");
        assert_eq!(parsed, Some(("JSESSIONID".into(), "F00D".into())));
    }

    #[test]
    fn test_parse_set_cookie_keeps_equals_in_value() {
        let parsed = parse_set_cookie("token=a=b=c");
        assert_eq!(parsed, Some(("token".into(), "a=b=c".into())));
    }

    #[test]
    fn test_parse_set_cookie_rejects_garbage() {
        assert_eq!(parse_set_cookie("no-equals-sign"), None);
        assert_eq!(parse_set_cookie("=value"), None);
    }
}
