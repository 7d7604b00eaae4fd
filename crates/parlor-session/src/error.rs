//! Session error taxonomy.
//!
//! Four classes with distinct propagation policies: auth errors are the
//! only fatal class (the boundary forces logout); transport and broker
//! errors reach the user as advisory notifications; decode errors are
//! handled inside the router and never surface as `Err` at all.

use chrono::{DateTime, Utc};
use parlor_core::ConnectionError;
use parlor_proto::ProtocolError;
use thiserror::Error;

/// Errors returned by [`crate::ChatSession::handle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An operation required an established connection.
    #[error("not connected to the broker")]
    NotConnected,

    /// Send was called with empty or whitespace-only content.
    #[error("message content is empty")]
    EmptyMessage,

    /// No credential is available for an operation that must carry one.
    #[error("no credential available")]
    CredentialMissing,

    /// The credential expired and the session can no longer act.
    #[error("credential expired at {expired_at}")]
    CredentialExpired {
        /// When the credential expired.
        expired_at: DateTime<Utc>,
    },

    /// Invalid connection lifecycle transition.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Failed to encode an outgoing envelope.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl SessionError {
    /// True for errors that end the session (the boundary must force a
    /// logout). Everything else is advisory.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CredentialMissing | Self::CredentialExpired { .. })
    }
}
