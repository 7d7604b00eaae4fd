//! Core state machines and abstractions for the Parlor chat client.
//!
//! # Components
//!
//! - [`ChatContext`] / [`ContextTarget`]: the conversation scope the user
//!   is viewing, and the invariant that exactly one is active
//! - [`Connection`]: the transport lifecycle state machine (connect,
//!   reconnect with fixed delay, terminal close)
//! - [`env::Environment`]: time and randomness abstraction enabling
//!   deterministic tests with virtual clocks
//!
//! Everything here is sans-IO in the same style as the session layer:
//! state machines take events and time as inputs and report what should
//! happen; the runtime performs the I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod connection;
mod context;
pub mod env;
mod error;

pub use connection::{
    Connection, ConnectionConfig, ConnectionState, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_RECONNECT_DELAY,
};
pub use context::{ChatContext, ContextTarget};
pub use error::ConnectionError;
