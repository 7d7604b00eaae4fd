//! Subscription topology manager.
//!
//! Keeps the active subscription set equal to the desired set derived
//! from the connection state and active context:
//!
//! ```text
//! {inbox, errors, typing}           always, while connected
//! ∪ {public-broadcast}              iff context is Public
//! ∪ {group:{id}:broadcast}          iff context is Group(id)
//! ```
//!
//! Direct contexts add nothing: direct delivery arrives on the inbox.
//!
//! Convergence is idempotent: converging twice against the same desired
//! state emits no actions, creates no duplicates, and leaks no handles.

use std::collections::{BTreeMap, BTreeSet};

use parlor_core::ChatContext;
use parlor_proto::ChannelKey;

use crate::event::SessionAction;

/// Bookkeeping for active broker subscriptions.
///
/// Each active subscription carries a monotonically-assigned id, the
/// opaque handle used for cancellation accounting. After a transport loss
/// the broker-side handles are dead; [`Topology::invalidate`] clears the
/// bookkeeping without emitting cancellations so convergence starts from
/// scratch on the next connect.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Active channel → subscription id.
    active: BTreeMap<ChannelKey, u64>,
    /// Next subscription id to assign.
    next_id: u64,
}

impl Topology {
    /// Empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The desired channel set for a user viewing `context`.
    fn desired(user_id: u64, context: ChatContext) -> BTreeSet<ChannelKey> {
        let mut set = BTreeSet::from([
            ChannelKey::Inbox(user_id),
            ChannelKey::Errors(user_id),
            ChannelKey::Typing(user_id),
        ]);
        if let Some(channel) = context.channel() {
            set.insert(channel);
        }
        set
    }

    /// Converge the active set toward the desired set for `context`.
    ///
    /// Emits cancellations for stale channels before subscriptions for
    /// new ones, so a context switch closes the previous context-specific
    /// channel before opening the next. Never fails; cancelling is always
    /// safe to request even if the handle is already gone.
    pub fn converge(&mut self, user_id: u64, context: ChatContext) -> Vec<SessionAction> {
        let desired = Self::desired(user_id, context);
        let mut actions = Vec::new();

        let stale: Vec<ChannelKey> =
            self.active.keys().filter(|key| !desired.contains(key)).copied().collect();
        for channel in stale {
            self.active.remove(&channel);
            actions.push(SessionAction::Unsubscribe { channel });
        }

        for channel in desired {
            if !self.active.contains_key(&channel) {
                self.next_id += 1;
                self.active.insert(channel, self.next_id);
                actions.push(SessionAction::Subscribe { channel });
            }
        }

        actions
    }

    /// Drop all bookkeeping after a transport loss.
    ///
    /// The handles died with the transport, so no cancellations are
    /// emitted. The desired state lives in the session's context and is
    /// re-established by the next [`Topology::converge`].
    pub fn invalidate(&mut self) {
        self.active.clear();
    }

    /// Channels currently believed subscribed, in stable order.
    pub fn active_channels(&self) -> Vec<ChannelKey> {
        self.active.keys().copied().collect()
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True when no subscriptions are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
