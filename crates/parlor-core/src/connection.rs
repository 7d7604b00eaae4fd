//! Transport lifecycle state machine.
//!
//! Owns the connect/disconnect/reconnect cycle for the single broker
//! connection. Heartbeats are negotiated at connect time (the transport
//! itself declares heartbeat timeouts and reports them as closes); this
//! machine owns the retry schedule.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐ handshake ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────>│ Connected │
//! └──────────────┘         └────────────┘           └───────────┘
//!                                ^                        │
//!                     5s elapsed │        transport close │
//!                                │                        v
//!                          ┌──────────────┐       (close also from
//!                          │ Reconnecting │        Connecting)
//!                          └──────────────┘
//!
//!            any state ──logout / credential failure──> Closed
//! ```
//!
//! Retries are unbounded with a fixed delay and no backoff growth. This
//! reproduces the observed production behavior; `ConnectionConfig`
//! isolates the values so a backoff policy can be swapped in without
//! touching the transitions.

use std::{
    ops::{Add, Sub},
    time::{Duration, Instant},
};

use crate::error::ConnectionError;

/// Bidirectional heartbeat interval negotiated with the broker.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(4000);

/// Fixed delay between a transport loss and the next dial attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none in progress.
    Disconnected,
    /// Dial and handshake in progress.
    Connecting,
    /// Transport established and usable.
    Connected,
    /// Transport lost; a redial is scheduled.
    Reconnecting,
    /// Terminal. A new login constructs a fresh machine.
    Closed,
}

/// Connection timing configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Heartbeat interval, both directions.
    pub heartbeat: Duration,
    /// Delay between transport loss and redial.
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Transport lifecycle state machine.
///
/// Pure state machine: time is passed as a parameter, no I/O. Generic
/// over `I` (the instant type) so tests can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    /// Current state.
    state: ConnectionState,
    /// Timing configuration.
    config: ConnectionConfig,
    /// When the next redial is due, while `Reconnecting`.
    retry_due: Option<I>,
    /// Why the machine closed, once `Closed`.
    close_reason: Option<String>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    /// Create a machine in [`ConnectionState::Disconnected`].
    pub fn new(config: ConnectionConfig) -> Self {
        Self { state: ConnectionState::Disconnected, config, retry_due: None, close_reason: None }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while the transport is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Heartbeat interval to negotiate at connect time.
    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        self.config.heartbeat
    }

    /// Close reason, once closed.
    #[must_use]
    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Begin the initial dial.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::InvalidState`] unless currently `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "begin_connect",
            });
        }

        self.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Record a successful transport handshake.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::InvalidState`] unless currently `Connecting`.
    pub fn established(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "established",
            });
        }

        self.state = ConnectionState::Connected;
        self.retry_due = None;
        Ok(())
    }

    /// Record a transport-level close or dial failure.
    ///
    /// Schedules the next redial and returns `true` when the machine
    /// entered `Reconnecting`. Closes while `Closed` or `Disconnected`
    /// are late events from an already-abandoned transport and are
    /// ignored (`false`).
    pub fn transport_closed(&mut self, now: I) -> bool {
        match self.state {
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Reconnecting => {
                self.state = ConnectionState::Reconnecting;
                self.retry_due = Some(now + self.config.reconnect_delay);
                true
            },
            ConnectionState::Disconnected | ConnectionState::Closed => false,
        }
    }

    /// Advance the retry schedule.
    ///
    /// Returns `true` when the redial delay has elapsed; the machine is
    /// then in `Connecting` and the caller should dial.
    pub fn tick(&mut self, now: I) -> bool {
        if self.state == ConnectionState::Reconnecting
            && self.retry_due.is_some_and(|due| now >= due)
        {
            self.state = ConnectionState::Connecting;
            self.retry_due = None;
            return true;
        }

        false
    }

    /// Close terminally (logout or unrecoverable auth failure).
    pub fn close(&mut self, reason: impl Into<String>) {
        self.state = ConnectionState::Closed;
        self.retry_due = None;
        self.close_reason = Some(reason.into());
    }
}

impl<I> Default for Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(ConnectionConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn happy_path_lifecycle() {
        let mut conn: Connection = Connection::default();
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        conn.begin_connect().unwrap();
        assert_eq!(conn.state(), ConnectionState::Connecting);

        conn.established().unwrap();
        assert!(conn.is_connected());
    }

    #[test]
    fn transport_close_schedules_redial_after_fixed_delay() {
        let start = t0();
        let mut conn: Connection = Connection::default();
        conn.begin_connect().unwrap();
        conn.established().unwrap();

        assert!(conn.transport_closed(start));
        assert_eq!(conn.state(), ConnectionState::Reconnecting);

        // Not yet due.
        assert!(!conn.tick(start + Duration::from_millis(4999)));
        assert_eq!(conn.state(), ConnectionState::Reconnecting);

        // Due at exactly the reconnect delay.
        assert!(conn.tick(start + DEFAULT_RECONNECT_DELAY));
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    #[test]
    fn retries_are_unbounded() {
        let start = t0();
        let mut conn: Connection = Connection::default();
        conn.begin_connect().unwrap();

        let mut now = start;
        for _ in 0..100 {
            assert!(conn.transport_closed(now));
            now = now + DEFAULT_RECONNECT_DELAY;
            assert!(conn.tick(now));
            assert_eq!(conn.state(), ConnectionState::Connecting);
        }
    }

    #[test]
    fn close_is_terminal() {
        let start = t0();
        let mut conn: Connection = Connection::default();
        conn.begin_connect().unwrap();
        conn.established().unwrap();

        conn.close("logout");
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.close_reason(), Some("logout"));

        // Late transport events and ticks change nothing.
        assert!(!conn.transport_closed(start));
        assert!(!conn.tick(start + Duration::from_secs(60)));
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(conn.begin_connect().is_err());
    }

    #[test]
    fn spurious_transitions_are_rejected() {
        let mut conn: Connection = Connection::default();

        // Handshake success without a dial in progress.
        assert!(matches!(
            conn.established(),
            Err(ConnectionError::InvalidState { operation: "established", .. })
        ));

        conn.begin_connect().unwrap();
        assert!(matches!(
            conn.begin_connect(),
            Err(ConnectionError::InvalidState { operation: "begin_connect", .. })
        ));
    }

    #[test]
    fn close_during_dial_enters_reconnecting() {
        let start = t0();
        let mut conn: Connection = Connection::default();
        conn.begin_connect().unwrap();

        // Dial failure behaves like any transport loss.
        assert!(conn.transport_closed(start));
        assert_eq!(conn.state(), ConnectionState::Reconnecting);
    }
}
