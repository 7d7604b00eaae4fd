//! Wire envelope types.
//!
//! The envelope is the JSON unit exchanged with the broker:
//!
//! ```json
//! {
//!   "content": "hi",
//!   "type": "CHAT",
//!   "sender": { "id": 1, "username": "alice" },
//!   "recipient": { "id": 2, "username": "bob" },
//!   "timestamp": "2025-06-01T12:00:00Z"
//! }
//! ```
//!
//! `recipient` and `group` are mutually exclusive for CHAT envelopes;
//! an envelope with neither addresses the public room. Optional fields are
//! omitted on the wire rather than serialized as `null`.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Event kind carried in the envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// User-visible chat message.
    Chat,
    /// A user joined the chat (presence).
    Join,
    /// A user left the chat (presence).
    Leave,
    /// Ephemeral typing indicator.
    Typing,
    /// A user was added to a group.
    GroupAdd,
    /// A user was removed from a group.
    GroupRemove,
}

/// Reference to a stored image, as the server exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Server-side image id.
    pub id: u64,

    /// Download URL for the image content.
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// A user as referenced in envelope routing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRef {
    /// Stable user id.
    pub id: u64,

    /// Display name.
    pub username: String,

    /// Avatar image, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl PeerRef {
    /// Reference without an avatar (the shape clients publish).
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self { id, username: username.into(), image: None }
    }
}

/// A group as referenced in envelope routing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Stable group id.
    pub id: u64,

    /// Display name.
    pub groupname: String,
}

impl GroupRef {
    /// Create a group reference.
    pub fn new(id: u64, groupname: impl Into<String>) -> Self {
        Self { id, groupname: groupname.into() }
    }
}

/// The JSON unit exchanged over the transport.
///
/// Decoded leniently: `content` defaults to empty (presence and typing
/// events carry none) and `timestamp` may be absent, in which case the
/// receiver assigns a provisional one during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message text. Empty for presence and typing events.
    #[serde(default)]
    pub content: String,

    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Originating user.
    pub sender: PeerRef,

    /// Direct-message recipient. Absent for public and group traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<PeerRef>,

    /// Target group. Absent for public and direct traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupRef>,

    /// ISO-8601 timestamp, server-assigned when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Envelope {
    /// Decode an envelope from its JSON wire form.
    pub fn decode(body: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Encode the envelope to its JSON wire form.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// True when the envelope carries no direct or group addressing.
    pub fn is_public(&self) -> bool {
        self.recipient.is_none() && self.group.is_none()
    }
}
