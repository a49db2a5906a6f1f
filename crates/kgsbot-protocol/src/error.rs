//! Error types for the protocol layer.
//!
//! Everything that can go wrong between raw JSON and a typed [`Message`]
//! lands here. Connection and transport failures live in their own crates.
//!
//! [`Message`]: crate::Message

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The value handed to the factory is not a message payload: not a JSON
    /// object, or an object without a string `type` field.
    #[error("not a message: {0}")]
    NotAMessage(String),

    /// The `type` tag is not one of the statically supported message types.
    #[error("unsupported message type {0:?}")]
    UnsupportedMessageType(String),

    /// A record field holds a value outside its enumerated set, e.g. an
    /// unknown user flag character or auth level.
    #[error("invalid value {value:?} for field {field}")]
    InvalidField {
        /// Wire name of the offending field.
        field: &'static str,
        /// The rejected value, as received.
        value: String,
    },

    /// A transport verb other than GET or POST.
    #[error("invalid action {0:?} (expected GET or POST)")]
    InvalidAction(String),

    /// A poll response without the top-level `messages` array, or a body
    /// that is not JSON at all.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Serializing a message body failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A declared field had the wrong JSON shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

impl ProtocolError {
    /// Shorthand for [`ProtocolError::InvalidField`].
    pub(crate) fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}
