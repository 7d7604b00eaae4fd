//! Boundary layer for the Parlor chat client.
//!
//! The session core is sans-IO; this crate is where I/O happens.
//!
//! # Components
//!
//! - [`Driver`]: trait abstracting the transport and the REST
//!   collaborators (roster, groups, history, admin checks)
//! - [`Runtime`]: generic loop that feeds events into the session and
//!   executes the actions it returns against a [`Driver`]
//! - [`Roster`]: view state filled in by collaborator fetches
//! - [`SystemEnv`]: production environment (system clock, OS randomness)
//!
//! Frontends implement [`Driver`] for their platform; the same runtime
//! then serves production transports and scripted test drivers alike.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod env;
mod runtime;
mod state;

pub use driver::Driver;
pub use env::SystemEnv;
pub use runtime::Runtime;
pub use state::{Group, Roster, User};
