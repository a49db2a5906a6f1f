//! # kgsbot
//!
//! Client library for writing bots against the KGS JSON game-server
//! servlet.
//!
//! A bot logs in, subscribes callbacks for the message types it cares
//! about, queues messages, and drives the connection with
//! [`Connection::step_loop`](kgsbot_session::Connection::step_loop).
//! The library handles cookies, pacing and keep-alive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kgsbot::prelude::*;
//!
//! # async fn run() -> Result<(), KgsError> {
//! kgsbot::init_tracing("info");
//!
//! let mut conn = KgsClient::builder()
//!     .url("http://localhost:8080/jsonClient/access")
//!     .credentials("OSRBot", "")
//!     .connect()
//!     .await?;
//!
//! conn.subscribe("ROOM_JOIN", callback(|resp| {
//!     tracing::info!(status = resp.status, "joined");
//! }))?;
//!
//! while conn.step_loop().await? {}
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{KgsClient, KgsClientBuilder, KgsConnection};
pub use error::KgsError;

pub use kgsbot_protocol as protocol;
pub use kgsbot_session as session;
pub use kgsbot_transport as transport;

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_directive` (e.g. `"info"` or `"kgsbot_session=debug"`).
///
/// Calling it again is a no-op.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a bot usually needs, in one import.
pub mod prelude {
    pub use crate::{KgsClient, KgsClientBuilder, KgsConnection, KgsError};
    pub use kgsbot_protocol::{
        Action, HelloMessage, LoginMessage, LoginSuccessMessage, Message,
        MessageBody, MessageType, RoomJoinMessage, ServerResponse,
    };
    pub use kgsbot_session::{
        callback, Callback, Connection, ConnectionConfig, ConnectionState,
        Credentials, MessageQueue,
    };
    pub use kgsbot_transport::{HttpResponse, HttpTransport, ReqwestTransport};
}
