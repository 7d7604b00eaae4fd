//! Session events and actions.
//!
//! [`SessionEvent`] is everything that can happen to the session: user
//! intents, transport lifecycle callbacks, inbound broker traffic,
//! collaborator results, and time. [`SessionAction`] is everything the
//! session wants done: transport operations, collaborator fetches, and
//! user-facing notifications. The caller executes actions and feeds
//! results back as events.

use std::time::Duration;

use parlor_core::{ChatContext, ContextTarget};
use parlor_proto::{ChannelKey, Destination, Message};

/// Events the caller feeds into the session.
///
/// Generic over `I` (instant type) to support both production time and
/// virtual time in tests.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// The user (or boundary) asked to establish the connection.
    Connect,

    /// The transport completed its handshake.
    TransportConnected,

    /// The transport closed or failed, including heartbeat timeouts the
    /// transport detected.
    TransportClosed {
        /// Transport-provided close reason.
        reason: String,
    },

    /// A raw message body arrived on a subscribed channel.
    EnvelopeReceived {
        /// Raw JSON body as delivered by the broker.
        body: String,
    },

    /// A server-pushed rejection arrived on the error queue.
    BrokerErrorReceived {
        /// Plain-text error payload.
        message: String,
    },

    /// The user selected a conversation to view.
    SelectContext {
        /// The selected conversation.
        target: ContextTarget,
    },

    /// The user submitted a chat message.
    SendChat {
        /// Raw input content; trimmed and validated by the session.
        content: String,
    },

    /// The user typed in the input field (drives the typing debounce).
    InputActivity,

    /// History fetch completed for a context.
    HistoryLoaded {
        /// Context the history belongs to.
        context: ChatContext,
        /// Messages in chronological order.
        messages: Vec<Message>,
    },

    /// Periodic tick driving deadlines: typing expiry, debounce fire,
    /// echo pruning, reconnect schedule.
    Tick {
        /// Current time.
        now: I,
    },

    /// The user logged out; the session closes terminally.
    Logout,
}

/// Connect-time parameters for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Bearer credential header.
    pub bearer: String,

    /// User-id correlation header.
    pub user_id: u64,

    /// Heartbeat interval to negotiate, both directions.
    pub heartbeat: Duration,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational notice.
    Info,
    /// Recoverable error (toast-equivalent).
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Display severity.
    pub severity: Severity,

    /// Human-readable text.
    pub message: String,
}

impl Notice {
    /// An error-severity notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, message: message.into() }
    }

    /// An info-severity notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, message: message.into() }
    }
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the transport with these parameters.
    Connect {
        /// Connect-time headers and heartbeat.
        params: ConnectParams,
    },

    /// Tear the transport down.
    Disconnect,

    /// Open a broker subscription.
    Subscribe {
        /// Channel to subscribe.
        channel: ChannelKey,
    },

    /// Cancel a broker subscription. Must be executed defensively: the
    /// handle may already be gone after a transport loss.
    Unsubscribe {
        /// Channel to cancel.
        channel: ChannelKey,
    },

    /// Publish a message body to a destination.
    Publish {
        /// Publish destination.
        destination: Destination,
        /// Bearer credential header.
        bearer: String,
        /// JSON body.
        body: String,
    },

    /// Fetch message history for a context and feed it back as
    /// [`SessionEvent::HistoryLoaded`].
    FetchHistory {
        /// Context to fetch.
        context: ChatContext,
    },

    /// Re-fetch the active-user roster (after JOIN/LEAVE).
    RefreshRoster,

    /// Re-fetch the user's groups (after GROUP_ADD/GROUP_REMOVE).
    RefreshGroups,

    /// Re-fetch the member list of a group.
    RefreshMembers {
        /// Group whose membership changed.
        group_id: u64,
    },

    /// Re-check admin status for a group.
    RefreshAdminStatus {
        /// Group to check.
        group_id: u64,
    },

    /// Show a notification to the user.
    Notify {
        /// The notification.
        notice: Notice,
    },

    /// Authentication is unrecoverable; the boundary must force logout.
    AuthRequired {
        /// Why authentication failed.
        reason: String,
    },
}
