//! HTTP transport implementation using `reqwest`.

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, COOKIE, SET_COOKIE};

use crate::{
    cookie_header, parse_set_cookie, Cookies, HttpResponse, HttpTransport,
    TransportError,
};

/// Request timeout used by [`ReqwestTransport::new`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`HttpTransport`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Builds a transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        cookies: Option<&Cookies>,
    ) -> Result<HttpResponse, TransportError> {
        let request = match cookies.and_then(cookie_header) {
            Some(value) => request.header(COOKIE, value),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status().as_u16();

        let mut set_cookies = Cookies::new();
        for value in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                tracing::debug!("skipping non-ASCII Set-Cookie header");
                continue;
            };
            if let Some((name, value)) = parse_set_cookie(raw) {
                set_cookies.insert(name, value);
            }
        }

        let body = response.bytes().await?.to_vec();
        tracing::trace!(status, bytes = body.len(), "http response received");

        Ok(HttpResponse {
            status,
            cookies: set_cookies,
            body,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        cookies: Option<&Cookies>,
    ) -> Result<HttpResponse, TransportError> {
        tracing::trace!(url, params = params.len(), "GET");
        let request = self.client.get(url).query(params);
        self.execute(request, cookies).await
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
        cookies: Option<&Cookies>,
    ) -> Result<HttpResponse, TransportError> {
        tracing::trace!(url, bytes = body.len(), "POST");
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
            request = request.header(name, value);
        }
        self.execute(request, cookies).await
    }
}
