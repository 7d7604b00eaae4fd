//! Protocol error types.
//!
//! Codec failures are recoverable by design: a malformed inbound envelope
//! is logged and dropped by the router, never propagated as a crash.

use thiserror::Error;

/// Errors produced while encoding or decoding wire envelopes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Envelope JSON failed to parse or serialize.
    #[error("malformed envelope: {reason}")]
    Malformed {
        /// Underlying serde failure, stringified for cloneability.
        reason: String,
    },

    /// A CHAT envelope addressed both a recipient and a group.
    ///
    /// A chat message is public (neither set), direct (recipient set), or
    /// group (group set), never two at once.
    #[error("chat envelope addresses both a recipient and a group")]
    ConflictingAddress,
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed { reason: err.to_string() }
    }
}
