//! Wire protocol for kgsbot.
//!
//! This crate defines what the client and the servlet say to each other:
//!
//! - **Messages** ([`Message`], [`MessageBody`], [`MessageType`],
//!   [`Action`]): the typed message model.
//! - **Records** ([`UserRecord`], [`FriendRecord`], [`RoomRecord`]):
//!   structured data nested inside messages.
//! - **Codec** ([`Formatter`], [`Factory`], [`ServerResponse`]): how
//!   messages become JSON and how poll responses become messages.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (HTTP exchanges) and session
//! (the connection state machine). It knows nothing about cookies, pacing
//! or callbacks.
//!
//! ```text
//! Transport (HttpResponse) → Protocol (Message) → Session (Connection)
//! ```

mod codec;
mod error;
mod message;
mod response;
mod types;

pub use codec::{Factory, Formatter, WirePayload};
pub use error::ProtocolError;
pub use message::{
    Action, HelloMessage, LoginMessage, LoginSuccessMessage, Message,
    MessageBody, MessageType, RoomJoinMessage,
};
pub use response::ServerResponse;
pub use types::{
    AuthLevel, FriendRecord, FriendType, RoomRecord, UserFlag, UserFlags,
    UserRecord,
};
