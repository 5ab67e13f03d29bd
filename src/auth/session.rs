//! Domain types shared across the session lifecycle components.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical staff role attached to a signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Doctor,
    Nurse,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory view of the current session, rebuilt from token claims and the
/// credential store. Available to consumers whenever the controller reports
/// an authenticated state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub role: Role,
    pub name: String,
    pub user_id: String,
    /// Derived from the token's own expiry claim, never from local
    /// wall-clock arithmetic at login time.
    pub expires_at: DateTime<Utc>,
}

/// Live signals published by the session monitor so the UI can render an
/// expiry warning banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSignals {
    pub remaining_seconds: i64,
    pub expiring_soon: bool,
}

/// Machine-readable cause attached to a forced navigation to the sign-in
/// surface, carried as a `?reason=` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    SessionExpired,
    TokenExpired,
    Logout,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::SessionExpired => "session_expired",
            RedirectReason::TokenExpired => "token_expired",
            RedirectReason::Logout => "logout",
        }
    }
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application screens as the route guard sees them. Everything except the
/// sign-in surface requires an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Patients,
    Appointments,
    Staff,
    Inventory,
    Records,
}

impl Screen {
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Screen::Login)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Login => "/login",
            Screen::Dashboard => "/dashboard",
            Screen::Patients => "/patients",
            Screen::Appointments => "/appointments",
            Screen::Staff => "/staff",
            Screen::Inventory => "/inventory",
            Screen::Records => "/records",
        }
    }
}

/// A navigation request emitted by the session controller. Fire-and-forget:
/// the controller never waits on the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub target: Screen,
    pub reason: Option<RedirectReason>,
}

impl Navigation {
    /// Location string per the redirect contract, e.g.
    /// `/login?reason=token_expired`.
    pub fn location(&self) -> String {
        match self.reason {
            Some(reason) => format!("{}?reason={}", self.target.path(), reason),
            None => self.target.path().to_string(),
        }
    }
}
