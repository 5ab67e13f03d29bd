//! Route guard: decides, per screen mount, whether protected content may
//! render or the user must be sent to the sign-in surface.

use super::controller::SessionController;
use super::session::{RedirectReason, Screen};

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: Screen,
        reason: Option<RedirectReason>,
    },
}

impl GuardDecision {
    /// Redirect location per the reason-code contract, `None` for `Allow`.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::Redirect { to, reason } => match reason {
                Some(reason) => Some(format!("{}?reason={}", to.path(), reason)),
                None => Some(to.path().to_string()),
            },
        }
    }
}

/// Check a screen mount against the current session state.
///
/// The sign-in surface itself is always allowed, so a redirect can never
/// loop. A redirect carries the reason the controller just recorded, if
/// any; otherwise the sign-in surface shows its generic prompt.
pub fn check(controller: &SessionController, screen: Screen) -> GuardDecision {
    if !screen.requires_auth() {
        return GuardDecision::Allow;
    }
    if controller.is_authenticated() {
        return GuardDecision::Allow;
    }
    GuardDecision::Redirect {
        to: Screen::Login,
        reason: controller.take_reason(),
    }
}

/// Banner style the sign-in surface renders for a redirect reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Warning(&'static str),
    Confirmation(&'static str),
}

/// Map a redirect reason to the sign-in surface banner. Expiry reasons warn;
/// an explicit logout is confirmed.
pub fn login_banner(reason: RedirectReason) -> Banner {
    match reason {
        RedirectReason::SessionExpired => {
            Banner::Warning("Your session has expired. Please sign in again.")
        }
        RedirectReason::TokenExpired => {
            Banner::Warning("Your sign-in is no longer valid. Please sign in again.")
        }
        RedirectReason::Logout => Banner::Confirmation("You have been signed out."),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::controller::SessionController;
    use crate::auth::session::Role;
    use crate::auth::store::MemoryStore;
    use crate::auth::token::token_expiring_at;

    const T0: i64 = 1_700_000_000;

    fn controller() -> (SessionController, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at(
            Utc.timestamp_opt(T0, 0).single().unwrap(),
        ));
        let (controller, _nav_rx) = SessionController::new(store, clock.clone());
        (controller, clock)
    }

    #[test]
    fn test_unauthenticated_mount_redirects_generic() {
        let (controller, _clock) = controller();
        let decision = check(&controller, Screen::Patients);
        assert_eq!(
            decision,
            GuardDecision::Redirect {
                to: Screen::Login,
                reason: None
            }
        );
        assert_eq!(decision.location().as_deref(), Some("/login"));
    }

    #[test]
    fn test_login_surface_never_redirects() {
        let (controller, _clock) = controller();
        assert_eq!(check(&controller, Screen::Login), GuardDecision::Allow);
    }

    #[tokio::test]
    async fn test_forced_logout_reason_surfaces_once() {
        let (controller, clock) = controller();
        controller
            .login(
                token_expiring_at(T0 + 60),
                Role::Doctor,
                "Alice".to_string(),
                "7".to_string(),
            )
            .unwrap();
        clock.advance(chrono::Duration::seconds(120));
        controller.refresh_status();

        let decision = check(&controller, Screen::Appointments);
        assert_eq!(
            decision.location().as_deref(),
            Some("/login?reason=token_expired")
        );

        // The reason is consumed; the next mount falls back to the generic prompt.
        let decision = check(&controller, Screen::Appointments);
        assert_eq!(decision.location().as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn test_authenticated_mount_is_allowed() {
        let (controller, _clock) = controller();
        controller
            .login(
                token_expiring_at(T0 + 3600),
                Role::Nurse,
                "Bea".to_string(),
                "9".to_string(),
            )
            .unwrap();
        assert_eq!(check(&controller, Screen::Records), GuardDecision::Allow);
    }

    #[test]
    fn test_banner_mapping() {
        assert!(matches!(
            login_banner(RedirectReason::SessionExpired),
            Banner::Warning(_)
        ));
        assert!(matches!(
            login_banner(RedirectReason::TokenExpired),
            Banner::Warning(_)
        ));
        assert!(matches!(
            login_banner(RedirectReason::Logout),
            Banner::Confirmation(_)
        ));
    }
}
