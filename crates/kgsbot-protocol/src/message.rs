//! The message model: every protocol message the client knows about.
//!
//! A [`Message`] is a [`MessageBody`] (which message, with its fields) plus
//! the HTTP verb it travels with. Bodies are an internally tagged enum, so a
//! body serializes as one flat JSON object with a `type` field:
//!
//! ```text
//! MessageBody::Login(LoginMessage { name: "OSRBot", .. })
//!   → { "type": "LOGIN", "name": "OSRBot", "password": "", "locale": "en_US" }
//! ```
//!
//! The serde derives double as the explicit per-variant field list: only
//! the fields declared on a body struct go on the wire.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{RawFriend, RawUser};
use crate::{FriendRecord, ProtocolError, RoomRecord, UserRecord};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The HTTP verb a message travels with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Query-encoded fields on a GET. Everything received from the server
    /// is tagged `Get`.
    Get,
    /// JSON body on a POST.
    Post,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            other => Err(ProtocolError::InvalidAction(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// The closed set of message types this client supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageType {
    Login,
    Hello,
    LoginSuccess,
    LoginFailedBadPassword,
    Logout,
    RoomJoin,
    WakeUp,
}

impl MessageType {
    /// Every supported type.
    pub const ALL: [MessageType; 7] = [
        Self::Login,
        Self::Hello,
        Self::LoginSuccess,
        Self::LoginFailedBadPassword,
        Self::Logout,
        Self::RoomJoin,
        Self::WakeUp,
    ];

    /// The wire tag, e.g. `"LOGIN_SUCCESS"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Hello => "HELLO",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailedBadPassword => "LOGIN_FAILED_BAD_PASSWORD",
            Self::Logout => "LOGOUT",
            Self::RoomJoin => "ROOM_JOIN",
            Self::WakeUp => "WAKE_UP",
        }
    }

    /// The verb a locally built message of this type is sent with.
    pub fn default_action(self) -> Action {
        match self {
            Self::Login | Self::Logout | Self::WakeUp => Action::Post,
            Self::Hello
            | Self::LoginSuccess
            | Self::LoginFailedBadPassword
            | Self::RoomJoin => Action::Get,
        }
    }

    /// Types the connection sends on its own to keep or end the session.
    pub fn is_session_control(self) -> bool {
        matches!(self, Self::Logout | Self::WakeUp)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtocolError::UnsupportedMessageType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Post-load
// ---------------------------------------------------------------------------

/// A body that can be built from an inbound JSON payload.
///
/// `Wire` is the shape serde fills in from the payload; fields missing from
/// the payload keep their defaults. `post_load` then turns nested raw
/// fragments into validated records. It consumes the wire value, so it runs
/// exactly once per message.
pub(crate) trait Inbound: Sized {
    type Wire: DeserializeOwned;

    fn post_load(wire: Self::Wire) -> Result<Self, ProtocolError>;
}

/// Deserializes `payload` into `T`'s wire shape and runs post-load.
pub(crate) fn load<T: Inbound>(
    payload: serde_json::Value,
) -> Result<T, ProtocolError> {
    let wire: T::Wire =
        serde_json::from_value(payload).map_err(ProtocolError::Decode)?;
    T::post_load(wire)
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// `LOGIN`: request a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginMessage {
    pub name: String,
    pub password: String,
    pub locale: String,
}

impl LoginMessage {
    pub const DEFAULT_LOCALE: &'static str = "en_US";

    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            locale: Self::DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl Default for LoginMessage {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl Inbound for LoginMessage {
    type Wire = Self;

    fn post_load(wire: Self) -> Result<Self, ProtocolError> {
        Ok(wire)
    }
}

/// `HELLO`: the first thing the server says once a login is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelloMessage {
    #[serde(deserialize_with = "string_or_number")]
    pub version_major: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version_minor: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version_bugfix: String,
    #[serde(deserialize_with = "string_or_number")]
    pub json_client_build: String,
}

impl Inbound for HelloMessage {
    type Wire = Self;

    fn post_load(wire: Self) -> Result<Self, ProtocolError> {
        Ok(wire)
    }
}

/// `LOGIN_SUCCESS`: who we are, our friends, and the rooms on offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccessMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub you: Option<UserRecord>,
    pub friends: Vec<FriendRecord>,
    /// Room category name → channel id.
    #[serde(serialize_with = "serialize_room_categories")]
    pub room_category_channel_ids: BTreeMap<String, u64>,
    pub rooms: Vec<RoomRecord>,
}

/// One element of the `roomCategoryChannelIds` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomCategoryEntry {
    category: String,
    channel_id: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct LoginSuccessWire {
    you: Option<RawUser>,
    friends: Vec<RawFriend>,
    room_category_channel_ids: Vec<RoomCategoryEntry>,
    rooms: Vec<RoomRecord>,
}

impl Inbound for LoginSuccessMessage {
    type Wire = LoginSuccessWire;

    fn post_load(wire: LoginSuccessWire) -> Result<Self, ProtocolError> {
        let you = wire.you.map(RawUser::load).transpose()?;
        let friends = wire
            .friends
            .into_iter()
            .map(RawFriend::load)
            .collect::<Result<Vec<_>, _>>()?;
        let room_category_channel_ids = wire
            .room_category_channel_ids
            .into_iter()
            .map(|entry| (entry.category, entry.channel_id))
            .collect();

        Ok(Self {
            you,
            friends,
            room_category_channel_ids,
            rooms: wire.rooms,
        })
    }
}

/// `ROOM_JOIN`: we entered a room (the server sends a few right after login).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinMessage {
    pub channel_id: u64,
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct RoomJoinWire {
    channel_id: u64,
    users: Vec<RawUser>,
}

impl Inbound for RoomJoinMessage {
    type Wire = RoomJoinWire;

    fn post_load(wire: RoomJoinWire) -> Result<Self, ProtocolError> {
        let users = wire
            .users
            .into_iter()
            .map(RawUser::load)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            channel_id: wire.channel_id,
            users,
        })
    }
}

// ---------------------------------------------------------------------------
// MessageBody
// ---------------------------------------------------------------------------

/// Which message, with its fields.
///
/// `#[serde(tag = "type")]` puts the tag inside the same object as the
/// fields, which is the shape the servlet speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageBody {
    Login(LoginMessage),
    Hello(HelloMessage),
    LoginSuccess(LoginSuccessMessage),
    LoginFailedBadPassword,
    Logout,
    RoomJoin(RoomJoinMessage),
    WakeUp,
}

impl MessageBody {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Login(_) => MessageType::Login,
            Self::Hello(_) => MessageType::Hello,
            Self::LoginSuccess(_) => MessageType::LoginSuccess,
            Self::LoginFailedBadPassword => MessageType::LoginFailedBadPassword,
            Self::Logout => MessageType::Logout,
            Self::RoomJoin(_) => MessageType::RoomJoin,
            Self::WakeUp => MessageType::WakeUp,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A protocol message: a body plus the verb it travels with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    action: Action,
    body: MessageBody,
}

impl Message {
    /// Wraps a locally built body, using its type's default verb.
    pub fn new(body: MessageBody) -> Self {
        let action = body.message_type().default_action();
        Self { action, body }
    }

    /// Wraps a body that came from the server. Always `GET`.
    pub(crate) fn inbound(body: MessageBody) -> Self {
        Self {
            action: Action::Get,
            body,
        }
    }

    pub fn login(login: LoginMessage) -> Self {
        Self::new(MessageBody::Login(login))
    }

    pub fn logout() -> Self {
        Self::new(MessageBody::Logout)
    }

    pub fn wake_up() -> Self {
        Self::new(MessageBody::WakeUp)
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn into_body(self) -> MessageBody {
        self.body
    }
}

impl From<MessageBody> for Message {
    fn from(body: MessageBody) -> Self {
        Self::new(body)
    }
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

/// Accepts `"3"`, `3` or `null` for a string field.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn serialize_room_categories<S>(
    categories: &BTreeMap<String, u64>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(categories.len()))?;
    for (category, channel_id) in categories {
        seq.serialize_element(&RoomCategoryEntry {
            category: category.clone(),
            channel_id: *channel_id,
        })?;
    }
    seq.end()
}
