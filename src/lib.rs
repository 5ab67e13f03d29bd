//! Session and token lifecycle core for the ClinicDesk client.
//!
//! The rest of the application is CRUD screens over the clinic API; this
//! crate holds the part with real state-machine and timing requirements:
//! tracking whether the current user is authenticated, deciding when the
//! token has gone stale, warning before forced sign-out, and keeping every
//! protected screen's view of authentication consistent.

pub mod api;
pub mod auth;
pub mod config;
