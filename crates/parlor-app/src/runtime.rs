//! Generic runtime orchestrating the session against a driver.
//!
//! The loop is the concrete form of the cooperative scheduling model:
//! one event at a time flows into the session, and every action it
//! returns executes before the next event is taken. Collaborator results
//! and transport failures are fed back into the session as events via an
//! internal queue, never by re-entering `handle` mid-action.

use std::collections::VecDeque;

use parlor_core::env::Environment;
use parlor_session::{
    ChatSession, Credential, Identity, Notice, SessionAction, SessionConfig, SessionEvent,
};

use crate::{driver::Driver, state::Roster};

/// Orchestrates one [`ChatSession`] against one [`Driver`].
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: ChatSession<E>,
    roster: Roster,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a runtime for an authenticated identity.
    pub fn new(
        driver: D,
        env: E,
        identity: Identity,
        credential: Option<Credential>,
        config: SessionConfig,
    ) -> Self {
        let session = ChatSession::new(env, identity, credential, config);
        Self { driver, session, roster: Roster::new() }
    }

    /// The managed session.
    pub fn session(&self) -> &ChatSession<E> {
        &self.session
    }

    /// Directory view state.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Run the event loop until the user logs out.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if polling for events fails; action
    /// execution failures are handled in-loop (fed back as transport
    /// events or surfaced as notifications).
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.dispatch(SessionEvent::Connect).await?;

        loop {
            let polled = self.driver.poll_event().await?;
            let logging_out = matches!(polled, Some(SessionEvent::Logout));

            if let Some(event) = polled {
                self.dispatch(event).await?;
            }
            if logging_out {
                return Ok(());
            }

            let now = self.driver.now();
            self.dispatch(SessionEvent::Tick { now }).await?;
        }
    }

    /// Feed one event into the session and execute everything it causes,
    /// including follow-up events produced by action execution.
    pub async fn dispatch(&mut self, event: SessionEvent<E::Instant>) -> Result<(), D::Error> {
        let mut queue: VecDeque<SessionEvent<E::Instant>> = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            match self.session.handle(event) {
                Ok(actions) => {
                    for action in actions {
                        self.execute(action, &mut queue).await;
                    }
                },
                Err(err) if err.is_fatal() => {
                    tracing::error!(error = %err, "session authentication failed");
                    self.driver.notify(&Notice::error(err.to_string()));
                    self.driver.on_auth_failure();
                },
                Err(err) => {
                    tracing::warn!(error = %err, "session rejected event");
                    self.driver.notify(&Notice::error(err.to_string()));
                },
            }
        }

        Ok(())
    }

    async fn execute(
        &mut self,
        action: SessionAction,
        queue: &mut VecDeque<SessionEvent<E::Instant>>,
    ) {
        match action {
            SessionAction::Connect { params } => {
                if let Err(err) = self.driver.connect(&params).await {
                    // Dial failures re-enter the machine as transport
                    // losses, which schedules the retry.
                    queue.push_back(SessionEvent::TransportClosed { reason: err.to_string() });
                }
            },
            SessionAction::Disconnect => self.driver.disconnect().await,
            SessionAction::Subscribe { channel } => {
                if let Err(err) = self.driver.subscribe(channel).await {
                    self.driver
                        .notify(&Notice::error(format!("subscribing {channel} failed: {err}")));
                }
            },
            SessionAction::Unsubscribe { channel } => {
                self.driver.unsubscribe(channel).await;
            },
            SessionAction::Publish { destination, bearer, body } => {
                if let Err(err) = self.driver.publish(destination, &bearer, &body).await {
                    self.driver.notify(&Notice::error(format!("send failed: {err}")));
                }
            },
            SessionAction::FetchHistory { context } => {
                match self.driver.fetch_history(context).await {
                    Ok(messages) => {
                        queue.push_back(SessionEvent::HistoryLoaded { context, messages });
                    },
                    Err(err) => {
                        self.driver
                            .notify(&Notice::error(format!("failed to load history: {err}")));
                    },
                }
            },
            SessionAction::RefreshRoster => match self.driver.fetch_active_users().await {
                Ok(users) => self.roster.set_users(users),
                Err(err) => {
                    tracing::warn!(error = %err, "roster refresh failed");
                },
            },
            SessionAction::RefreshGroups => match self.driver.fetch_user_groups().await {
                Ok(groups) => self.roster.set_groups(groups),
                Err(err) => {
                    tracing::warn!(error = %err, "group refresh failed");
                },
            },
            SessionAction::RefreshMembers { group_id } => {
                match self.driver.fetch_group_members(group_id).await {
                    Ok(members) => self.roster.set_members(group_id, members),
                    Err(err) => {
                        tracing::warn!(error = %err, group_id, "membership refresh failed");
                    },
                }
            },
            SessionAction::RefreshAdminStatus { group_id } => {
                match self.driver.fetch_is_group_admin(group_id).await {
                    Ok(is_admin) => self.roster.set_admin(group_id, is_admin),
                    Err(err) => {
                        tracing::warn!(error = %err, group_id, "admin check failed");
                    },
                }
            },
            SessionAction::Notify { notice } => self.driver.notify(&notice),
            SessionAction::AuthRequired { reason } => {
                tracing::error!(%reason, "authentication required");
                self.driver.on_auth_failure();
            },
        }
    }
}
