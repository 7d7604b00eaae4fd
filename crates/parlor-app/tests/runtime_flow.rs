//! Runtime integration: scripted driver, full event loop.
//!
//! Drives [`Runtime::run`] with a scripted driver and asserts on the
//! I/O it performed, through the same seam a production transport
//! implements.

#![allow(clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Instant,
};

use parlor_app::{Driver, Group, Runtime, User};
use parlor_core::{ChatContext, env::test_utils::MockEnv};
use parlor_proto::{ChannelKey, Destination, Envelope, EventKind, Message, PeerRef};
use parlor_session::{
    ConnectParams, Credential, Environment, Identity, Notice, SessionConfig, SessionEvent,
};

#[derive(Clone, Default)]
struct IoLog(Arc<Mutex<Vec<String>>>);

impl IoLog {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Driver that replays a fixed event script and records every I/O call.
struct ScriptedDriver {
    events: VecDeque<SessionEvent<Instant>>,
    log: IoLog,
    users: Vec<User>,
}

impl ScriptedDriver {
    fn new(events: Vec<SessionEvent<Instant>>, log: IoLog) -> Self {
        Self {
            events: events.into(),
            log,
            users: vec![User::new(9, "ina")],
        }
    }
}

impl Driver for ScriptedDriver {
    type Error = std::io::Error;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<SessionEvent<Instant>>, Self::Error> {
        Ok(self.events.pop_front())
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn connect(&mut self, params: &ConnectParams) -> Result<(), Self::Error> {
        self.log.push(format!("connect user={} bearer={}", params.user_id, params.bearer));
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.log.push("disconnect");
    }

    async fn subscribe(&mut self, channel: ChannelKey) -> Result<(), Self::Error> {
        self.log.push(format!("subscribe {channel}"));
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: ChannelKey) {
        self.log.push(format!("unsubscribe {channel}"));
    }

    async fn publish(
        &mut self,
        destination: Destination,
        _bearer: &str,
        body: &str,
    ) -> Result<(), Self::Error> {
        self.log.push(format!("publish {destination} {body}"));
        Ok(())
    }

    async fn fetch_active_users(&mut self) -> Result<Vec<User>, Self::Error> {
        self.log.push("fetch_active_users");
        Ok(self.users.clone())
    }

    async fn fetch_user_groups(&mut self) -> Result<Vec<Group>, Self::Error> {
        self.log.push("fetch_user_groups");
        Ok(vec![])
    }

    async fn fetch_group_members(&mut self, group_id: u64) -> Result<Vec<User>, Self::Error> {
        self.log.push(format!("fetch_group_members {group_id}"));
        Ok(vec![])
    }

    async fn fetch_is_group_admin(&mut self, group_id: u64) -> Result<bool, Self::Error> {
        self.log.push(format!("fetch_is_group_admin {group_id}"));
        Ok(false)
    }

    async fn fetch_history(&mut self, context: ChatContext) -> Result<Vec<Message>, Self::Error> {
        self.log.push(format!("fetch_history {context}"));
        Ok(vec![])
    }

    fn on_auth_failure(&mut self) {
        self.log.push("on_auth_failure");
    }

    fn notify(&mut self, notice: &Notice) {
        self.log.push(format!("notify {}", notice.message));
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn join_body(user: (u64, &str)) -> String {
    Envelope {
        content: String::new(),
        kind: EventKind::Join,
        sender: PeerRef::new(user.0, user.1),
        recipient: None,
        group: None,
        timestamp: None,
    }
    .encode()
    .unwrap()
}

#[tokio::test]
async fn full_session_flow_touches_the_right_io() {
    init_tracing();
    let log = IoLog::default();
    let driver = ScriptedDriver::new(
        vec![
            SessionEvent::TransportConnected,
            SessionEvent::EnvelopeReceived { body: join_body((9, "ina")) },
            SessionEvent::SendChat { content: "hello world".to_string() },
            SessionEvent::Logout,
        ],
        log.clone(),
    );

    let mut runtime = Runtime::new(
        driver,
        MockEnv::with_seed(17),
        Identity::new(1, "alice"),
        Some(Credential::new("token-1")),
        SessionConfig::default(),
    );
    runtime.run().await.unwrap();

    let entries = log.entries();

    // Connect carried the credential and identity headers.
    assert!(entries.iter().any(|e| e == "connect user=1 bearer=token-1"));

    // Mandatory subscriptions plus the public channel.
    for channel in ["user:1:inbox", "user:1:errors", "user:1:typing", "public-broadcast"] {
        assert!(
            entries.iter().any(|e| e == &format!("subscribe {channel}")),
            "missing subscription for {channel}: {entries:?}"
        );
    }

    // Presence announcement, the chat publish, and the logout sequence.
    assert!(entries.iter().any(|e| e.starts_with("publish chat.join")));
    assert!(
        entries
            .iter()
            .any(|e| e.starts_with("publish chat.send ") && e.contains("hello world"))
    );
    assert!(entries.iter().any(|e| e.starts_with("publish chat.leave")));
    assert!(entries.iter().any(|e| e == "disconnect"));

    // The JOIN triggered a roster refresh that landed in view state.
    assert!(entries.iter().any(|e| e == "fetch_active_users"));
    assert_eq!(runtime.roster().users().len(), 1);
    assert_eq!(runtime.roster().users()[0].username, "ina");

    // The public JOIN notice and the local echo are both in the list.
    let messages = runtime.session().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, EventKind::Join);
    assert_eq!(messages[1].content, "hello world");
    assert!(messages[1].is_local_echo);
}

#[tokio::test]
async fn expired_credential_forces_the_login_boundary() {
    let log = IoLog::default();
    let env = MockEnv::with_seed(19);
    let expired =
        Credential::expiring("stale", env.wall_clock() - chrono::TimeDelta::seconds(1));

    let driver = ScriptedDriver::new(vec![SessionEvent::Logout], log.clone());
    let mut runtime = Runtime::new(
        driver,
        env,
        Identity::new(1, "alice"),
        Some(expired),
        SessionConfig::default(),
    );
    runtime.run().await.unwrap();

    let entries = log.entries();
    assert!(entries.iter().any(|e| e == "on_auth_failure"));
    assert!(!entries.iter().any(|e| e.starts_with("connect")), "must fail closed: {entries:?}");
}
