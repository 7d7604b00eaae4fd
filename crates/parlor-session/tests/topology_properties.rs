//! Property-based tests for the subscription invariant.
//!
//! For any sequence of context switches and transport losses, a connected
//! and converged session's active subscription set must equal exactly
//! `{inbox, errors, typing} ∪ {context channel}`: no duplicate
//! subscribes, no leaked handles, no cancellations of channels that were
//! never opened.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use parlor_core::env::test_utils::MockEnv;
use parlor_proto::{ChannelKey, GroupRef, PeerRef};
use parlor_session::{
    ChatSession, ContextTarget, Credential, Environment, Identity, SessionAction, SessionConfig,
    SessionEvent,
};
use proptest::prelude::*;

const USER: u64 = 1;

fn target_strategy() -> impl Strategy<Value = ContextTarget> {
    prop_oneof![
        1 => Just(ContextTarget::Public),
        2 => (2u64..12).prop_map(|id| ContextTarget::Direct(PeerRef::new(id, "peer"))),
        2 => (1u64..8).prop_map(|id| ContextTarget::Group(GroupRef::new(id, "group"))),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Select(ContextTarget),
    DropTransport,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => target_strategy().prop_map(Op::Select),
        1 => Just(Op::DropTransport),
    ]
}

/// Expected channel set for a connected session viewing `target`.
fn expected_channels(target: &ContextTarget) -> BTreeSet<ChannelKey> {
    let mut set = BTreeSet::from([
        ChannelKey::Inbox(USER),
        ChannelKey::Errors(USER),
        ChannelKey::Typing(USER),
    ]);
    if let Some(channel) = target.key().channel() {
        set.insert(channel);
    }
    set
}

/// Apply subscription actions to a mirror of the driver's handle table,
/// asserting against duplicates and dangling cancellations.
fn apply_actions(mirror: &mut BTreeSet<ChannelKey>, actions: &[SessionAction]) {
    for action in actions {
        match action {
            SessionAction::Subscribe { channel } => {
                assert!(mirror.insert(*channel), "duplicate subscribe for {channel}");
            },
            SessionAction::Unsubscribe { channel } => {
                assert!(mirror.remove(channel), "cancelled a never-opened channel {channel}");
            },
            _ => {},
        }
    }
}

fn connected_session(env: &MockEnv) -> (ChatSession<MockEnv>, BTreeSet<ChannelKey>) {
    let mut session = ChatSession::new(
        env.clone(),
        Identity::new(USER, "alice"),
        Some(Credential::new("token")),
        SessionConfig::default(),
    );
    let mut mirror = BTreeSet::new();

    session.handle(SessionEvent::Connect).unwrap();
    let actions = session.handle(SessionEvent::TransportConnected).unwrap();
    apply_actions(&mut mirror, &actions);

    (session, mirror)
}

proptest! {
    #[test]
    fn active_set_matches_invariant_after_any_switch_sequence(
        targets in prop::collection::vec(target_strategy(), 0..32),
    ) {
        let env = MockEnv::with_seed(11);
        let (mut session, mut mirror) = connected_session(&env);

        for target in targets {
            let actions = session.handle(SessionEvent::SelectContext {
                target: target.clone(),
            }).unwrap();
            apply_actions(&mut mirror, &actions);

            let expected = expected_channels(&target);
            prop_assert_eq!(&mirror, &expected);

            let bookkeeping: BTreeSet<ChannelKey> =
                session.active_channels().into_iter().collect();
            prop_assert_eq!(&bookkeeping, &expected);
        }
    }

    #[test]
    fn invariant_survives_transport_losses(
        ops in prop::collection::vec(op_strategy(), 0..32),
    ) {
        let env = MockEnv::with_seed(13);
        let (mut session, mut mirror) = connected_session(&env);
        let mut current = ContextTarget::Public;

        for op in ops {
            match op {
                Op::Select(target) => {
                    current = target.clone();
                    let actions = session
                        .handle(SessionEvent::SelectContext { target })
                        .unwrap();
                    apply_actions(&mut mirror, &actions);
                },
                Op::DropTransport => {
                    let _ = session.handle(SessionEvent::TransportClosed {
                        reason: "lost".to_string(),
                    }).unwrap();
                    // Handles died with the transport on both sides.
                    mirror.clear();
                    prop_assert!(session.active_channels().is_empty());

                    // Redial at the fixed delay, then re-establish.
                    env.advance(std::time::Duration::from_millis(5000));
                    let actions = session
                        .handle(SessionEvent::Tick { now: env.now() })
                        .unwrap();
                    prop_assert!(
                        actions.iter().any(|action| matches!(
                            action,
                            SessionAction::Connect { .. }
                        )),
                        "expected a Connect action after redial"
                    );

                    let actions = session.handle(SessionEvent::TransportConnected).unwrap();
                    apply_actions(&mut mirror, &actions);
                },
            }

            prop_assert_eq!(&mirror, &expected_channels(&current));
        }
    }
}
