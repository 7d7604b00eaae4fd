//! Outbound envelope composition.
//!
//! Builds the four outgoing envelope shapes (join, leave, chat, typing)
//! addressed from the active context, and owns the trailing-edge debounce
//! that rate-limits typing indicators.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parlor_core::ContextTarget;
use parlor_proto::{Envelope, EventKind, PeerRef};

use crate::auth::Identity;

/// Recipient reference as published: id and username, no avatar.
fn recipient_ref(target: &ContextTarget) -> Option<PeerRef> {
    target.peer().map(|peer| PeerRef::new(peer.id, peer.username.clone()))
}

/// Compose a chat message envelope for the active context.
pub fn chat_envelope(
    identity: &Identity,
    target: &ContextTarget,
    content: impl Into<String>,
    timestamp: DateTime<Utc>,
) -> Envelope {
    Envelope {
        content: content.into(),
        kind: EventKind::Chat,
        sender: identity.peer_ref(),
        recipient: recipient_ref(target),
        group: target.group().cloned(),
        timestamp: Some(timestamp.to_rfc3339()),
    }
}

/// Compose a typing indicator envelope for the active context.
pub fn typing_envelope(
    identity: &Identity,
    target: &ContextTarget,
    timestamp: DateTime<Utc>,
) -> Envelope {
    Envelope {
        content: String::new(),
        kind: EventKind::Typing,
        sender: identity.peer_ref(),
        recipient: recipient_ref(target),
        group: target.group().cloned(),
        timestamp: Some(timestamp.to_rfc3339()),
    }
}

/// Compose the presence announcement published on connect.
pub fn join_envelope(identity: &Identity, timestamp: DateTime<Utc>) -> Envelope {
    Envelope {
        content: String::new(),
        kind: EventKind::Join,
        sender: identity.peer_ref(),
        recipient: None,
        group: None,
        timestamp: Some(timestamp.to_rfc3339()),
    }
}

/// Compose the presence retraction published on logout.
pub fn leave_envelope(identity: &Identity, timestamp: DateTime<Utc>) -> Envelope {
    Envelope {
        content: String::new(),
        kind: EventKind::Leave,
        sender: identity.peer_ref(),
        recipient: None,
        group: None,
        timestamp: Some(timestamp.to_rfc3339()),
    }
}

/// Trailing-edge debounce for outbound typing indicators.
///
/// Every keystroke re-arms the deadline; the indicator fires once the
/// input has been quiet for the debounce window. Continued bursts of
/// typing therefore produce at most one publish per window, ~window after
/// the last keystroke.
#[derive(Debug, Clone, Default)]
pub struct TypingDebounce<I> {
    last_input: Option<I>,
}

impl<I: Copy + Ord + std::ops::Sub<Output = Duration>> TypingDebounce<I> {
    /// Unarmed debounce.
    #[must_use]
    pub fn new() -> Self {
        Self { last_input: None }
    }

    /// Record input activity, re-arming the deadline.
    pub fn note(&mut self, now: I) {
        self.last_input = Some(now);
    }

    /// True once the window has elapsed since the last keystroke.
    /// Disarms on fire.
    pub fn fire_due(&mut self, now: I, window: Duration) -> bool {
        match self.last_input {
            Some(last) if now - last >= window => {
                self.last_input = None;
                true
            },
            _ => false,
        }
    }

    /// Disarm without firing.
    pub fn reset(&mut self) {
        self.last_input = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use parlor_proto::{Destination, GroupRef};

    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn identity() -> Identity {
        Identity::new(1, "alice")
    }

    #[test]
    fn chat_envelope_addresses_follow_the_target() {
        let wall = DateTime::<Utc>::UNIX_EPOCH;

        let public = chat_envelope(&identity(), &ContextTarget::Public, "hi", wall);
        assert!(public.is_public());

        let direct = chat_envelope(
            &identity(),
            &ContextTarget::Direct(PeerRef::new(2, "bob")),
            "hi",
            wall,
        );
        assert_eq!(direct.recipient.as_ref().map(|r| r.id), Some(2));
        assert!(direct.group.is_none());

        let group = chat_envelope(
            &identity(),
            &ContextTarget::Group(GroupRef::new(7, "team")),
            "hi",
            wall,
        );
        assert_eq!(group.group.as_ref().map(|g| g.id), Some(7));
        assert!(group.recipient.is_none());
    }

    #[test]
    fn presence_envelopes_carry_no_addressing() {
        let wall = DateTime::<Utc>::UNIX_EPOCH;

        let join = join_envelope(&identity(), wall);
        assert_eq!(join.kind, EventKind::Join);
        assert!(join.is_public());
        assert!(join.timestamp.is_some());

        let leave = leave_envelope(&identity(), wall);
        assert_eq!(leave.kind, EventKind::Leave);
        assert!(leave.is_public());
    }

    #[test]
    fn typing_destination_matches_context() {
        let group = ContextTarget::Group(GroupRef::new(7, "team"));
        assert_eq!(group.key().typing_destination(), Destination::TypingGroup(7));

        let envelope = typing_envelope(&identity(), &group, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(envelope.kind, EventKind::Typing);
        assert_eq!(envelope.group.as_ref().map(|g| g.id), Some(7));
    }

    #[test]
    fn burst_of_keystrokes_fires_once_after_the_last() {
        let t0 = Instant::now();
        let mut debounce = TypingDebounce::new();

        // 10 keystrokes 20ms apart: each re-arms the deadline.
        let mut last = t0;
        for i in 0..10 {
            last = t0 + Duration::from_millis(20 * i);
            debounce.note(last);
            assert!(!debounce.fire_due(last, DEBOUNCE));
        }

        // Quiet for 499ms: nothing yet.
        assert!(!debounce.fire_due(last + Duration::from_millis(499), DEBOUNCE));

        // 500ms after the last keystroke: exactly one fire.
        assert!(debounce.fire_due(last + DEBOUNCE, DEBOUNCE));
        assert!(!debounce.fire_due(last + Duration::from_secs(2), DEBOUNCE));
    }

    #[test]
    fn reset_disarms_without_firing() {
        let t0 = Instant::now();
        let mut debounce = TypingDebounce::new();
        debounce.note(t0);

        debounce.reset();
        assert!(!debounce.fire_due(t0 + Duration::from_secs(1), DEBOUNCE));
    }
}
