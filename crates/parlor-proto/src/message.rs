//! Canonical message type.
//!
//! Inbound envelopes and history responses normalize into [`Message`],
//! which is what the session stores and the UI renders. Normalization
//! fills the gaps the wire leaves open: absent timestamps get a
//! caller-supplied fallback, and every message receives a stable identity.

use chrono::{DateTime, Utc};

use crate::{
    envelope::{Envelope, EventKind},
    error::ProtocolError,
};

/// A chat message in canonical internal form.
///
/// Created once, on send (local echo) or on receipt, and never mutated
/// afterwards, except that a provisional local echo may be replaced
/// wholesale by its server-confirmed copy during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Stable identity. Server-assigned when available, otherwise derived
    /// from `(timestamp, sender, random suffix)`.
    pub id: String,

    /// Originating user id.
    pub sender_id: u64,

    /// Originating user display name.
    pub sender_name: String,

    /// Avatar download URL for the sender, when known.
    pub sender_avatar: Option<String>,

    /// Direct-message recipient id, if any.
    pub recipient_id: Option<u64>,

    /// Direct-message recipient display name, if any.
    pub recipient_name: Option<String>,

    /// Target group id, if any.
    pub group_id: Option<u64>,

    /// Message text.
    pub content: String,

    /// Message time. Server-assigned when the envelope carried one,
    /// client-assigned provisionally otherwise.
    pub timestamp: DateTime<Utc>,

    /// Event kind this message was derived from.
    pub kind: EventKind,

    /// True while this is an optimistic local echo awaiting the broker's
    /// confirmed copy.
    pub is_local_echo: bool,
}

impl Message {
    /// Normalize a decoded envelope into a canonical message.
    ///
    /// `fallback` supplies the timestamp when the envelope has none or an
    /// unparseable one.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::ConflictingAddress`] if a CHAT envelope sets both
    /// a recipient and a group.
    pub fn from_envelope(
        envelope: &Envelope,
        id: String,
        fallback: DateTime<Utc>,
    ) -> Result<Self, ProtocolError> {
        if envelope.kind == EventKind::Chat
            && envelope.recipient.is_some()
            && envelope.group.is_some()
        {
            return Err(ProtocolError::ConflictingAddress);
        }

        let timestamp = envelope
            .timestamp
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(fallback, |parsed| parsed.with_timezone(&Utc));

        Ok(Self {
            id,
            sender_id: envelope.sender.id,
            sender_name: envelope.sender.username.clone(),
            sender_avatar: envelope
                .sender
                .image
                .as_ref()
                .map(|image| image.download_url.clone()),
            recipient_id: envelope.recipient.as_ref().map(|peer| peer.id),
            recipient_name: envelope
                .recipient
                .as_ref()
                .map(|peer| peer.username.clone()),
            group_id: envelope.group.as_ref().map(|group| group.id),
            content: envelope.content.clone(),
            timestamp,
            kind: envelope.kind,
            is_local_echo: false,
        })
    }
}
