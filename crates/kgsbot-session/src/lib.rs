//! Session layer for kgsbot.
//!
//! This crate drives one logged-in client session against the servlet:
//!
//! 1. **Handshake**: POST a LOGIN, keep the cookies, poll until HELLO
//!    ([`Connection::connect`])
//! 2. **Paced sending**: a FIFO [`MessageQueue`] drained at most one
//!    message per pacing interval, with a `WAKE_UP` queued after a stretch
//!    of inactivity ([`Connection::step_loop`])
//! 3. **Dispatch**: responses handed to the callbacks subscribed to the
//!    sent message's type ([`CallbackRegistry`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Bot code (above)  ← subscribes callbacks, queues messages, calls step_loop
//!     ↕
//! Session Layer (this crate)  ← cookies, pacing, keep-alive, dispatch
//!     ↕
//! Protocol Layer (below)  ← Message, Formatter, ServerResponse
//!     ↕
//! Transport Layer  ← HttpTransport
//! ```

mod connection;
mod error;
mod queue;
mod registry;
mod session;

pub use connection::{Connection, JSON_CONTENT_TYPE};
pub use error::SessionError;
pub use queue::MessageQueue;
pub use registry::{callback, Callback, CallbackRegistry};
pub use session::{ConnectionConfig, ConnectionState, Credentials, Session};
