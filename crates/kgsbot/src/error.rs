//! Unified error type for kgsbot.

use kgsbot_protocol::ProtocolError;
use kgsbot_session::SessionError;
use kgsbot_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `kgsbot` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum KgsError {
    /// HTTP exchange failed (connect, timeout, bad header).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be formatted or a response could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Handshake, queue or callback failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client builder was missing something it needs.
    #[error("client misconfigured: {0}")]
    Config(String),
}
