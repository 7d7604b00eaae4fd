//! Error types for the connection lifecycle.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from the connection state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// An operation was requested in a state that does not permit it.
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State the machine was in when the operation was requested.
        state: ConnectionState,
        /// The operation that was attempted.
        operation: &'static str,
    },
}
