//! Top-level chat session state machine.
//!
//! `ChatSession` is the single owner of connection state, active context,
//! message list, typing signals, and pending echoes. External components
//! never mutate these directly; they request transitions by feeding
//! events through [`ChatSession::handle`] and execute the returned
//! actions.

use std::time::Duration;

use parlor_core::{
    ChatContext, Connection, ConnectionConfig, ConnectionState, ContextTarget, env::Environment,
};
use parlor_proto::{Destination, Envelope, EventKind, Message};

use crate::{
    auth::{Credential, Identity},
    echo::EchoRegistry,
    error::SessionError,
    event::{ConnectParams, Notice, SessionAction, SessionEvent},
    outbox::{self, TypingDebounce},
    topology::Topology,
    typing::TypingTracker,
};

/// How long a typing signal stays live without a refresh.
pub const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_secs(3);

/// Quiet window before an outbound typing indicator fires.
pub const DEFAULT_TYPING_DEBOUNCE: Duration = Duration::from_millis(500);

/// How long a local echo waits for its server-confirmed copy.
pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_secs(10);

/// Session timing configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Connection lifecycle timing (heartbeat, reconnect delay).
    pub connection: ConnectionConfig,

    /// Typing signal expiry.
    pub typing_expiry: Duration,

    /// Outbound typing debounce window.
    pub typing_debounce: Duration,

    /// Echo reconciliation window.
    pub echo_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            typing_expiry: DEFAULT_TYPING_EXPIRY,
            typing_debounce: DEFAULT_TYPING_DEBOUNCE,
            echo_window: DEFAULT_ECHO_WINDOW,
        }
    }
}

/// The realtime chat session state machine.
///
/// Pure state machine in the action pattern: consumes [`SessionEvent`]s,
/// returns [`SessionAction`]s, performs no I/O. Generic over
/// [`Environment`] so tests run on virtual time with seeded randomness.
pub struct ChatSession<E: Environment> {
    /// Time and randomness source.
    env: E,

    /// The authenticated user.
    identity: Identity,

    /// Current bearer credential, if any.
    credential: Option<Credential>,

    /// Timing configuration.
    config: SessionConfig,

    /// Transport lifecycle.
    connection: Connection<E::Instant>,

    /// Active conversation selection.
    target: ContextTarget,

    /// Subscription bookkeeping.
    topology: Topology,

    /// Messages of the active context, in arrival order.
    messages: Vec<Message>,

    /// Live typing signals.
    typing: TypingTracker<E::Instant>,

    /// Outbound typing debounce.
    debounce: TypingDebounce<E::Instant>,

    /// Local echoes awaiting confirmation.
    echoes: EchoRegistry<E::Instant>,
}

impl<E: Environment> ChatSession<E> {
    /// Create a session for an authenticated identity.
    pub fn new(
        env: E,
        identity: Identity,
        credential: Option<Credential>,
        config: SessionConfig,
    ) -> Self {
        let connection = Connection::new(config.connection.clone());
        Self {
            env,
            identity,
            credential,
            config,
            connection,
            target: ContextTarget::Public,
            topology: Topology::new(),
            messages: Vec::new(),
            typing: TypingTracker::new(),
            debounce: TypingDebounce::new(),
            echoes: EchoRegistry::new(),
        }
    }

    /// The authenticated user.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Replace the credential (after a renewal at the login boundary).
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Active context in key form.
    pub fn context(&self) -> ChatContext {
        self.target.key()
    }

    /// Active conversation selection.
    pub fn target(&self) -> &ContextTarget {
        &self.target
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// True while the transport is established.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Messages of the active context, in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Users currently typing in the active context.
    pub fn typing_senders(&self) -> Vec<u64> {
        self.typing.typing_senders(self.context())
    }

    /// Channels currently believed subscribed.
    pub fn active_channels(&self) -> Vec<parlor_proto::ChannelKey> {
        self.topology.active_channels()
    }

    /// Local echoes still awaiting their confirmed copy.
    pub fn pending_echo_count(&self) -> usize {
        self.echoes.len()
    }

    /// Process one event and return the actions to execute.
    ///
    /// # Errors
    ///
    /// Fatal errors ([`SessionError::is_fatal`]) mean the session is
    /// unusable and the boundary must force a logout; everything else is
    /// advisory and leaves the session running.
    pub fn handle(
        &mut self,
        event: SessionEvent<E::Instant>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Connect => self.handle_connect(),
            SessionEvent::TransportConnected => self.handle_transport_connected(),
            SessionEvent::TransportClosed { reason } => self.handle_transport_closed(&reason),
            SessionEvent::EnvelopeReceived { body } => self.handle_envelope(&body),
            SessionEvent::BrokerErrorReceived { message } => Ok(vec![SessionAction::Notify {
                notice: Notice::error(message),
            }]),
            SessionEvent::SelectContext { target } => self.handle_select_context(target),
            SessionEvent::SendChat { content } => self.handle_send_chat(&content),
            SessionEvent::InputActivity => self.handle_input_activity(),
            SessionEvent::HistoryLoaded { context, messages } => {
                self.handle_history_loaded(context, messages)
            },
            SessionEvent::Tick { now } => self.handle_tick(now),
            SessionEvent::Logout => self.handle_logout(),
        }
    }

    /// Current bearer token, failing closed on missing or expired
    /// credentials.
    fn bearer(&self) -> Result<String, SessionError> {
        let credential = self.credential.as_ref().ok_or(SessionError::CredentialMissing)?;

        let now = self.env.wall_clock();
        if credential.is_expired(now) {
            return Err(SessionError::CredentialExpired {
                expired_at: credential.expires_at.unwrap_or(now),
            });
        }

        Ok(credential.token.clone())
    }

    fn connect_params(&self, bearer: String) -> ConnectParams {
        ConnectParams {
            bearer,
            user_id: self.identity.user_id,
            heartbeat: self.connection.heartbeat(),
        }
    }

    fn handle_connect(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let bearer = match self.bearer() {
            Ok(bearer) => bearer,
            Err(err) => {
                // Unrecoverable before we even dial.
                self.connection.close(err.to_string());
                return Err(err);
            },
        };

        self.connection.begin_connect()?;
        Ok(vec![SessionAction::Connect { params: self.connect_params(bearer) }])
    }

    fn handle_transport_connected(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        self.connection.established()?;

        let mut actions = self.topology.converge(self.identity.user_id, self.context());

        let bearer = self.bearer()?;
        let envelope = outbox::join_envelope(&self.identity, self.env.wall_clock());
        actions.push(SessionAction::Publish {
            destination: Destination::Join,
            bearer,
            body: envelope.encode()?,
        });

        Ok(actions)
    }

    fn handle_transport_closed(
        &mut self,
        reason: &str,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if !self.connection.transport_closed(self.env.now()) {
            // Late close from an already-abandoned transport.
            return Ok(vec![]);
        }

        tracing::warn!(%reason, "transport closed, scheduling reconnect");
        self.topology.invalidate();
        self.debounce.reset();

        Ok(vec![SessionAction::Notify {
            notice: Notice::error(format!("connection lost: {reason}")),
        }])
    }

    fn handle_select_context(
        &mut self,
        target: ContextTarget,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.target = target;
        self.messages.clear();
        self.typing.clear();
        self.echoes.clear();
        self.debounce.reset();

        let context = self.context();
        let mut actions = Vec::new();

        // Subscribe before fetching history so nothing lands in the gap;
        // the history merge deduplicates the overlap.
        if self.connection.is_connected() {
            actions.extend(self.topology.converge(self.identity.user_id, context));
        }
        actions.push(SessionAction::FetchHistory { context });

        if let Some(group_id) = context.group_id() {
            actions.push(SessionAction::RefreshMembers { group_id });
            actions.push(SessionAction::RefreshAdminStatus { group_id });
        }

        Ok(actions)
    }

    fn handle_send_chat(&mut self, content: &str) -> Result<Vec<SessionAction>, SessionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if !self.connection.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let bearer = self.bearer()?;

        let wall = self.env.wall_clock();
        let envelope = outbox::chat_envelope(&self.identity, &self.target, content, wall);
        let body = envelope.encode()?;

        // Optimistic echo: the list mutates before the publish executes.
        let id = format!("temp-{}-{}", wall.timestamp_millis(), self.env.random_suffix());
        let mut local = Message::from_envelope(&envelope, id.clone(), wall)?;
        local.is_local_echo = true;

        self.echoes.register(id, content, self.context(), self.env.now());
        self.messages.push(local);

        Ok(vec![SessionAction::Publish {
            destination: self.context().send_destination(),
            bearer,
            body,
        }])
    }

    fn handle_input_activity(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        // Suppressed entirely while disconnected.
        if self.connection.is_connected() {
            self.debounce.note(self.env.now());
        }
        Ok(vec![])
    }

    fn handle_envelope(&mut self, body: &str) -> Result<Vec<SessionAction>, SessionError> {
        let envelope = match Envelope::decode(body) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed inbound envelope");
                return Ok(vec![SessionAction::Notify {
                    notice: Notice::error("received a malformed message"),
                }]);
            },
        };

        Ok(self.route(&envelope))
    }

    /// Classify and dispatch one decoded envelope.
    fn route(&mut self, envelope: &Envelope) -> Vec<SessionAction> {
        let context = self.context();

        if envelope.kind == EventKind::Typing {
            if envelope.sender.id != self.identity.user_id && self.typing_matches(envelope) {
                let deadline = self.env.now() + self.config.typing_expiry;
                self.typing.refresh(envelope.sender.id, context, deadline);
            }
            return Vec::new();
        }

        let mut actions = Vec::new();

        if self.is_relevant(envelope) {
            self.append_relevant(envelope, &mut actions);
        }

        // Side effects are independent of relevance and display.
        match envelope.kind {
            EventKind::Join | EventKind::Leave => actions.push(SessionAction::RefreshRoster),
            EventKind::GroupAdd | EventKind::GroupRemove => {
                actions.push(SessionAction::RefreshGroups);
                if let Some(group_id) = context.group_id()
                    && envelope.group.as_ref().is_some_and(|group| group.id == group_id)
                {
                    actions.push(SessionAction::RefreshMembers { group_id });
                    actions.push(SessionAction::RefreshAdminStatus { group_id });
                }
            },
            EventKind::Chat | EventKind::Typing => {},
        }

        actions
    }

    /// Typing addressing match against the active context.
    fn typing_matches(&self, envelope: &Envelope) -> bool {
        match self.context() {
            ChatContext::Public => envelope.is_public(),
            ChatContext::Direct { peer_id } => envelope.sender.id == peer_id,
            ChatContext::Group { group_id } => {
                envelope.group.as_ref().is_some_and(|group| group.id == group_id)
            },
        }
    }

    /// Display relevance against the active context.
    fn is_relevant(&self, envelope: &Envelope) -> bool {
        match self.context() {
            ChatContext::Public => envelope.is_public(),
            ChatContext::Direct { peer_id } => {
                // A direct conversation involves the peer on either side:
                // the peer's inbound messages, and our own copies echoed
                // back from the broker (recipient == peer).
                envelope.kind == EventKind::Chat
                    && envelope.group.is_none()
                    && (envelope.sender.id == peer_id
                        || envelope.recipient.as_ref().is_some_and(|peer| peer.id == peer_id))
            },
            ChatContext::Group { group_id } => {
                envelope.kind == EventKind::Chat
                    && envelope.group.as_ref().is_some_and(|group| group.id == group_id)
            },
        }
    }

    /// Normalize a relevant envelope and append it, reconciling against
    /// pending local echoes.
    fn append_relevant(&mut self, envelope: &Envelope, actions: &mut Vec<SessionAction>) {
        let wall = self.env.wall_clock();
        let raw_timestamp =
            envelope.timestamp.clone().unwrap_or_else(|| wall.to_rfc3339());
        let id = format!("{raw_timestamp}-{}-{}", envelope.sender.id, self.env.random_suffix());

        let message = match Message::from_envelope(envelope, id, wall) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "dropping inbound envelope with invalid addressing");
                actions.push(SessionAction::Notify {
                    notice: Notice::error("received a malformed message"),
                });
                return;
            },
        };

        let context = self.context();
        let now = self.env.now();
        if message.kind == EventKind::Chat
            && message.sender_id == self.identity.user_id
            && let Some(echo_id) =
                self.echoes.take_match(&message.content, context, now, self.config.echo_window)
        {
            // Confirmed copy replaces the provisional entry.
            if let Some(entry) = self.messages.iter_mut().find(|entry| entry.id == echo_id) {
                *entry = message;
                return;
            }
        }

        self.messages.push(message);
    }

    fn handle_history_loaded(
        &mut self,
        context: ChatContext,
        messages: Vec<Message>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        // A fetch for a context we already left; late results are ignored.
        if context != self.context() {
            return Ok(vec![]);
        }

        // Messages that raced in between subscribe and fetch completion
        // stay, deduplicated against the fetched history.
        let live = std::mem::take(&mut self.messages);
        self.messages = messages;
        for message in live {
            let duplicate = self.messages.iter().any(|existing| {
                existing.sender_id == message.sender_id
                    && existing.content == message.content
                    && existing.timestamp == message.timestamp
            });
            if !duplicate {
                self.messages.push(message);
            }
        }

        Ok(vec![])
    }

    fn handle_tick(&mut self, now: E::Instant) -> Result<Vec<SessionAction>, SessionError> {
        let mut actions = Vec::new();

        self.typing.expire(now);
        self.echoes.prune(now, self.config.echo_window);

        if self.connection.is_connected()
            && self.debounce.fire_due(now, self.config.typing_debounce)
        {
            match self.bearer() {
                Ok(bearer) => {
                    let envelope =
                        outbox::typing_envelope(&self.identity, &self.target, self.env.wall_clock());
                    match envelope.encode() {
                        Ok(body) => actions.push(SessionAction::Publish {
                            destination: self.context().typing_destination(),
                            bearer,
                            body,
                        }),
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to encode typing envelope");
                        },
                    }
                },
                Err(err) => self.fail_auth(&err, &mut actions),
            }
        }

        if self.connection.tick(now) {
            // Redial is due; the credential is re-validated each attempt.
            match self.bearer() {
                Ok(bearer) => {
                    actions.push(SessionAction::Connect { params: self.connect_params(bearer) });
                },
                Err(err) => self.fail_auth(&err, &mut actions),
            }
        }

        Ok(actions)
    }

    /// Close the session over an auth failure detected during
    /// housekeeping, where returning `Err` would drop sibling actions.
    fn fail_auth(&mut self, err: &SessionError, actions: &mut Vec<SessionAction>) {
        self.connection.close(err.to_string());
        actions.push(SessionAction::AuthRequired { reason: err.to_string() });
    }

    fn handle_logout(&mut self) -> Result<Vec<SessionAction>, SessionError> {
        let mut actions = Vec::new();

        if self.connection.is_connected()
            && let Ok(bearer) = self.bearer()
        {
            let envelope = outbox::leave_envelope(&self.identity, self.env.wall_clock());
            if let Ok(body) = envelope.encode() {
                actions.push(SessionAction::Publish {
                    destination: Destination::Leave,
                    bearer,
                    body,
                });
            }
        }
        actions.push(SessionAction::Disconnect);

        self.connection.close("logout");
        self.topology.invalidate();
        self.messages.clear();
        self.typing.clear();
        self.echoes.clear();
        self.debounce.reset();

        Ok(actions)
    }
}
