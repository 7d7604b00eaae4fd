//! Chat session state machine for the Parlor client.
//!
//! [`ChatSession`] owns everything that makes the realtime client hard:
//! the subscription topology tracking the active conversation context,
//! classification and routing of inbound broker events, optimistic local
//! echoes reconciled against server-confirmed copies, and ephemeral
//! typing state.
//!
//! # Architecture
//!
//! Sans-IO and action-based: the session consumes [`SessionEvent`]s,
//! mutates its state, and returns [`SessionAction`]s for the caller to
//! execute. All transitions happen one event at a time on the caller's
//! thread; timers are deadlines checked on `Tick` events, so there are no
//! handles to leak and arbitrary interleavings of inbound messages, user
//! input, and timer fires are tolerated by construction.
//!
//! # Components
//!
//! - [`ChatSession`]: top-level state machine
//! - [`Topology`]: idempotent subscription convergence
//! - [`TypingTracker`]: deadline-based typing signals
//! - [`EchoRegistry`]: pending local echoes awaiting confirmation
//! - [`outbox`]: outbound envelope composition and typing debounce

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod auth;
mod echo;
mod error;
mod event;
pub mod outbox;
mod session;
mod topology;
mod typing;

pub use auth::{Credential, Identity};
pub use echo::EchoRegistry;
pub use error::SessionError;
pub use event::{ConnectParams, Notice, Severity, SessionAction, SessionEvent};
pub use parlor_core::{ChatContext, ContextTarget, env::Environment};
pub use session::{ChatSession, SessionConfig};
pub use topology::Topology;
pub use typing::TypingTracker;
