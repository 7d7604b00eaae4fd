//! Driver trait abstracting I/O and collaborator services.
//!
//! The session core calls none of these directly: it emits
//! [`parlor_session::SessionAction`]s, the [`crate::Runtime`] executes
//! them against a `Driver`, and results flow back in as events. The
//! trait therefore mirrors the session's action surface plus the REST
//! collaborators the original system consumes.

use std::{future::Future, ops::{Add, Sub}, time::Duration};

use parlor_core::ChatContext;
use parlor_proto::{ChannelKey, Destination, Message};
use parlor_session::{ConnectParams, Notice, SessionEvent};

use crate::state::{Group, User};

/// Platform-specific I/O for the runtime.
///
/// One implementation wraps the production broker transport and REST
/// API; tests use scripted implementations. All methods that talk to the
/// network are fallible; the runtime maps their failures onto the
/// session's error taxonomy (transport failures feed back as transport
/// events, collaborator failures surface as notifications).
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type, matching the session environment's.
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + Sub<Output = Duration>
        + Add<Duration, Output = Self::Instant>;

    /// Wait for the next input event (user intent or transport
    /// callback).
    ///
    /// Returns `None` when the poll interval elapses with no event,
    /// which paces the runtime's tick.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionEvent<Self::Instant>>, Self::Error>> + Send;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Open the broker connection with the given headers and heartbeat.
    fn connect(
        &mut self,
        params: &ConnectParams,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Tear the broker connection down.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Open a subscription.
    fn subscribe(
        &mut self,
        channel: ChannelKey,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Cancel a subscription. Must tolerate handles already torn down by
    /// a transport loss.
    fn unsubscribe(&mut self, channel: ChannelKey) -> impl Future<Output = ()> + Send;

    /// Publish a body to a destination with a bearer credential.
    fn publish(
        &mut self,
        destination: Destination,
        bearer: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Fetch the active-user roster.
    fn fetch_active_users(
        &mut self,
    ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;

    /// Fetch the groups the current user belongs to.
    fn fetch_user_groups(&mut self)
    -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send;

    /// Fetch the member list of one group.
    fn fetch_group_members(
        &mut self,
        group_id: u64,
    ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send;

    /// Check whether the current user administers a group.
    fn fetch_is_group_admin(
        &mut self,
        group_id: u64,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Fetch message history for a context.
    fn fetch_history(
        &mut self,
        context: ChatContext,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send;

    /// Authentication is unrecoverable; navigate to the login boundary.
    fn on_auth_failure(&mut self);

    /// Show a notification to the user.
    fn notify(&mut self, notice: &Notice);
}
