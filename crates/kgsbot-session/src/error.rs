//! Error types for the session layer.

use kgsbot_protocol::{MessageType, ProtocolError};
use kgsbot_transport::TransportError;

/// Errors that can occur while driving a [`Connection`](crate::Connection).
///
/// Validation problems (unknown tag, unknown callback) fail fast. Transport
/// and protocol failures during the handshake's polling are retried by the
/// handshake itself; once connected they are returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A message could not be built, formatted or parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The HTTP exchange itself failed (connect, timeout, TLS...).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `unsubscribe` for a type that has no subscriber list.
    #[error("no callbacks registered for {0}")]
    NoSubscribers(MessageType),

    /// `unsubscribe` with a callback that is not registered for the type.
    #[error("callback not found for {0}")]
    CallbackNotFound(MessageType),

    /// The connection was closed; nothing more can be queued or sent.
    #[error("session is closed")]
    SessionClosed,

    /// The servlet answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    /// The login POST was refused.
    #[error("login rejected with HTTP status {status}")]
    LoginRejected { status: u16 },

    /// The handshake polled the configured maximum without seeing HELLO.
    #[error("no HELLO after {polls} polls")]
    HandshakeExhausted { polls: u32 },
}
