/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client failed: connect, timeout, TLS, or body read.
    #[cfg(feature = "http")]
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A header name or value could not be put on the request.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The request could not be completed for a reason the transport
    /// describes itself (used by non-reqwest transports).
    #[error("request failed: {0}")]
    Request(String),
}
