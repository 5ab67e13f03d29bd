//! Session and token lifecycle management.
//!
//! This module reconciles three independent timelines - user-initiated
//! login/logout, wall-clock token expiry, and the recurring background
//! check - into one consistent authentication state:
//!
//! - `CredentialStore`: persisted token + identity fields, one logical unit
//! - `token`: pure claim decoding and expiry arithmetic (advisory, UX-only)
//! - monitor: recurring check that warns before expiry and forces sign-out
//! - `SessionController`: the state machine everything else observes
//! - `guard`: per-screen redirect decisions with reason codes

pub mod clock;
pub mod controller;
pub mod guard;
pub mod monitor;
pub mod session;
pub mod store;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use controller::{SessionController, SessionSettings, SessionState};
pub use guard::{Banner, GuardDecision};
pub use session::{
    Navigation, RedirectReason, Role, Screen, SessionSignals, SessionSnapshot,
};
pub use store::{CredentialStore, Credentials, FileStore, MemoryStore};
pub use token::{AuthError, Claims, TokenStatus};
