//! Session identity and credential.

use chrono::{DateTime, Utc};
use parlor_proto::{ImageRef, PeerRef};

/// The authenticated user this session acts as.
///
/// Resolved by the login boundary before the session is constructed; the
/// session itself never performs authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id, also the correlation header at connect time.
    pub user_id: u64,

    /// Display name used in outgoing envelopes.
    pub username: String,

    /// Avatar reference, when the user has one.
    pub avatar: Option<ImageRef>,
}

impl Identity {
    /// Identity without an avatar.
    pub fn new(user_id: u64, username: impl Into<String>) -> Self {
        Self { user_id, username: username.into(), avatar: None }
    }

    /// This identity as envelope routing metadata.
    pub fn peer_ref(&self) -> PeerRef {
        PeerRef { id: self.user_id, username: self.username.clone(), image: self.avatar.clone() }
    }
}

/// Bearer credential attached to connects and publishes.
///
/// The session checks expiry before use and fails closed; renewal is the
/// login boundary's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token.
    pub token: String,

    /// Expiry instant, when the token carries one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Credential without a known expiry.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into(), expires_at: None }
    }

    /// Credential with an expiry instant.
    pub fn expiring(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self { token: token.into(), expires_at: Some(expires_at) }
    }

    /// True when the token is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
