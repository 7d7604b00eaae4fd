//! Wire protocol for the Parlor chat client.
//!
//! Defines the JSON envelope exchanged with the message broker, the
//! canonical [`Message`] it normalizes into, and the naming contract for
//! subscription channels and publish destinations.
//!
//! # Components
//!
//! - [`Envelope`]: the JSON unit on the wire, with routing metadata
//! - [`Message`]: canonical internal message with normalized fields
//! - [`ChannelKey`]: subscription channel names
//! - [`Destination`]: publish destination names
//!
//! This crate is a pure data layer: no I/O, no state. Higher layers decide
//! when to encode, decode, and route.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod envelope;
mod error;
mod message;

pub use channel::{ChannelKey, Destination};
pub use envelope::{Envelope, EventKind, GroupRef, ImageRef, PeerRef};
pub use error::ProtocolError;
pub use message::Message;
