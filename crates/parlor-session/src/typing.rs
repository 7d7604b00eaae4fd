//! Ephemeral typing-signal state.
//!
//! Signals are keyed by `(sender, context)` and expire on a deadline
//! rather than a timer handle: each tick sweeps expired entries, so
//! nothing can fire after teardown. Refreshing a signal replaces its
//! deadline. Context switches discard all signals.

use std::collections::HashMap;

use parlor_core::ChatContext;

/// Live typing signals with their expiry deadlines.
#[derive(Debug, Clone, Default)]
pub struct TypingTracker<I> {
    deadlines: HashMap<(u64, ChatContext), I>,
}

impl<I: Copy + Ord> TypingTracker<I> {
    /// Empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self { deadlines: HashMap::new() }
    }

    /// Raise or refresh a signal, replacing any prior deadline for the
    /// same key.
    pub fn refresh(&mut self, sender_id: u64, context: ChatContext, deadline: I) {
        self.deadlines.insert((sender_id, context), deadline);
    }

    /// Sweep signals whose deadline has passed.
    pub fn expire(&mut self, now: I) {
        self.deadlines.retain(|_, deadline| *deadline > now);
    }

    /// Drop all signals (context switch or teardown).
    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    /// Senders currently typing in `context`, in ascending id order.
    pub fn typing_senders(&self, context: ChatContext) -> Vec<u64> {
        let mut senders: Vec<u64> = self
            .deadlines
            .keys()
            .filter(|(_, signal_context)| *signal_context == context)
            .map(|(sender_id, _)| *sender_id)
            .collect();
        senders.sort_unstable();
        senders
    }

    /// True when no signal is live anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    const EXPIRY: Duration = Duration::from_secs(3);

    #[test]
    fn signal_expires_after_three_seconds() {
        let t0 = Instant::now();
        let context = ChatContext::Direct { peer_id: 2 };
        let mut tracker = TypingTracker::new();

        tracker.refresh(2, context, t0 + EXPIRY);

        tracker.expire(t0 + Duration::from_millis(2900));
        assert_eq!(tracker.typing_senders(context), vec![2]);

        tracker.expire(t0 + Duration::from_millis(3100));
        assert!(tracker.typing_senders(context).is_empty());
    }

    #[test]
    fn refresh_extends_the_deadline() {
        let t0 = Instant::now();
        let context = ChatContext::Public;
        let mut tracker = TypingTracker::new();

        tracker.refresh(5, context, t0 + EXPIRY);

        // Refreshed at t=2s: deadline moves to t=5s.
        tracker.refresh(5, context, t0 + Duration::from_secs(2) + EXPIRY);

        tracker.expire(t0 + Duration::from_secs(4));
        assert_eq!(tracker.typing_senders(context), vec![5]);

        tracker.expire(t0 + Duration::from_millis(5100));
        assert!(tracker.is_empty());
    }

    #[test]
    fn signals_in_different_contexts_are_independent() {
        let t0 = Instant::now();
        let group_a = ChatContext::Group { group_id: 1 };
        let group_b = ChatContext::Group { group_id: 2 };
        let mut tracker = TypingTracker::new();

        tracker.refresh(5, group_a, t0 + EXPIRY);
        tracker.refresh(6, group_b, t0 + EXPIRY);

        assert_eq!(tracker.typing_senders(group_a), vec![5]);
        assert_eq!(tracker.typing_senders(group_b), vec![6]);
    }

    #[test]
    fn clear_drops_everything() {
        let t0 = Instant::now();
        let mut tracker = TypingTracker::new();
        tracker.refresh(1, ChatContext::Public, t0 + EXPIRY);
        tracker.refresh(2, ChatContext::Public, t0 + EXPIRY);

        tracker.clear();
        assert!(tracker.is_empty());
    }
}
