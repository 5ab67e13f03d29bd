//! Session controller: the single source of truth for authentication state.
//!
//! Constructed once per process with the credential store and clock passed
//! in as dependencies. Three timelines converge here - user-initiated
//! login/logout, wall-clock token expiry, and the recurring monitor check -
//! and all of them funnel through the same validation and teardown paths so
//! no combination of them can double-clear the store or double-redirect.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::monitor::{self, MonitorHandle};
use super::session::{
    Navigation, RedirectReason, Role, Screen, SessionSignals, SessionSnapshot,
};
use super::store::{CredentialStore, Credentials};
use super::token::{self, AuthError};

/// Default period between monitor checks.
pub const DEFAULT_MONITOR_PERIOD: Duration = Duration::from_secs(60);

/// Default warning window before expiry, in minutes.
pub const DEFAULT_WARNING_THRESHOLD_MINUTES: i64 = 5;

/// Authentication state as observed by the rest of the application.
/// `ExpiringSoon` is a sub-state of authenticated; `LoggingOut` is transient
/// and only ever held inside the teardown funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    ExpiringSoon,
    LoggingOut,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated | SessionState::ExpiringSoon)
    }
}

/// Tunables for the monitor loop.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub monitor_period: Duration,
    pub warning_threshold_minutes: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            monitor_period: DEFAULT_MONITOR_PERIOD,
            warning_threshold_minutes: DEFAULT_WARNING_THRESHOLD_MINUTES,
        }
    }
}

/// Mutable session state, guarded by one mutex. The lock is never held
/// across an await point; navigation and signal sends are synchronous.
struct Cell {
    state: SessionState,
    snapshot: Option<SessionSnapshot>,
    /// Reason recorded for the route guard to surface on the next protected
    /// mount, consumed on read.
    pending_reason: Option<RedirectReason>,
    monitor: Option<MonitorHandle>,
}

pub(crate) struct Inner {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    nav_tx: mpsc::UnboundedSender<Navigation>,
    signals_tx: watch::Sender<SessionSignals>,
    cell: Mutex<Cell>,
}

impl Inner {
    fn navigate(&self, target: Screen, reason: Option<RedirectReason>) {
        // Fire-and-forget: a dropped receiver just means nobody is routing.
        if self
            .nav_tx
            .send(Navigation { target, reason })
            .is_err()
        {
            debug!("navigation receiver dropped");
        }
    }

    /// Tear the session down and redirect. No-op unless currently
    /// authenticated, which is what makes a manual logout racing a monitor
    /// tick (or a second logout call) emit exactly one navigation.
    pub(crate) fn teardown(&self, reason: RedirectReason) {
        {
            let mut cell = self.cell.lock().unwrap();
            if !cell.state.is_authenticated() {
                debug!(reason = %reason, "already signed out, ignoring teardown");
                return;
            }
            cell.state = SessionState::LoggingOut;
            if let Some(handle) = cell.monitor.take() {
                handle.stop();
            }
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "failed to clear stored credentials");
            }
            cell.snapshot = None;
            cell.pending_reason = Some(reason);
            cell.state = SessionState::Unauthenticated;
        }
        let _ = self.signals_tx.send(SessionSignals::default());
        self.navigate(Screen::Login, Some(reason));
        info!(reason = %reason, "session ended");
    }

    /// One validity check. This is the shared funnel behind monitor ticks
    /// and `refresh_status`, so both paths behave identically. Returns
    /// false once the session is gone and ticking should stop.
    pub(crate) fn check_session(&self) -> bool {
        {
            let cell = self.cell.lock().unwrap();
            if !cell.state.is_authenticated() {
                return false;
            }
        }

        let credentials = match self.store.get() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                // No credentials to monitor; nothing to do this tick.
                debug!("credential store empty, skipping check");
                return true;
            }
            Err(error) => {
                // An unusable record is no better than an absent one.
                debug!(%error, "stored credentials unusable, skipping check");
                return true;
            }
        };

        let now = self.clock.now();
        let status = token::validate(&credentials.token, now);
        if !status.is_valid {
            debug!(error = ?status.error, "stored token no longer valid");
            self.teardown(RedirectReason::TokenExpired);
            return false;
        }

        let remaining = token::remaining_seconds(&credentials.token, now);
        let soon = token::is_expiring_soon(
            &credentials.token,
            self.settings.warning_threshold_minutes,
            now,
        );

        {
            let mut cell = self.cell.lock().unwrap();
            // A logout can land between the check above and here.
            if !cell.state.is_authenticated() {
                return false;
            }
            cell.state = if soon {
                SessionState::ExpiringSoon
            } else {
                SessionState::Authenticated
            };
        }
        let _ = self.signals_tx.send(SessionSignals {
            remaining_seconds: remaining,
            expiring_soon: soon,
        });
        true
    }
}

/// Handle to the per-process session state. Cheap to clone; all clones share
/// the same state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Build a controller with default settings. Returns the controller and
    /// the navigation event receiver.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        Self::with_settings(store, clock, SessionSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let (signals_tx, _) = watch::channel(SessionSignals::default());
        let inner = Arc::new(Inner {
            store,
            clock,
            settings,
            nav_tx,
            signals_tx,
            cell: Mutex::new(Cell {
                state: SessionState::Unauthenticated,
                snapshot: None,
                pending_reason: None,
                monitor: None,
            }),
        });
        (Self { inner }, nav_rx)
    }

    /// Accept a token and identity from the auth API, persist them as one
    /// group, start the monitor, and navigate to the landing surface.
    ///
    /// The token must decode to claims with a future expiry and the identity
    /// fields must be non-empty; otherwise the error is returned and no
    /// state is mutated.
    pub fn login(
        &self,
        token: String,
        role: Role,
        name: String,
        user_id: String,
    ) -> Result<(), AuthError> {
        if name.is_empty() || user_id.is_empty() {
            // Accepting these would leave an authenticated session whose
            // record the store refuses to hold.
            warn!("rejecting login with missing identity fields");
            return Err(AuthError::IncompleteCredentials);
        }

        let now = self.inner.clock.now();
        let status = token::validate(&token, now);
        let Some(expires_at) = status.expires_at.filter(|_| status.is_valid) else {
            let error = status.error.unwrap_or(AuthError::MalformedToken);
            warn!(error = %error, "rejecting login with invalid token");
            return Err(error);
        };

        let doctor_id = match role {
            Role::Doctor => user_id.parse().ok(),
            Role::Nurse => None,
        };
        let credentials = Credentials {
            token,
            role,
            name: name.clone(),
            user_id: user_id.clone(),
            doctor_id,
        };
        if let Err(e) = self.inner.store.set(&credentials) {
            // The in-memory session still works; reloads just won't restore.
            warn!(error = %e, "failed to persist credentials");
        }

        let remaining = token::remaining_seconds(&credentials.token, now);
        let soon = token::is_expiring_soon(
            &credentials.token,
            self.inner.settings.warning_threshold_minutes,
            now,
        );

        {
            let mut cell = self.inner.cell.lock().unwrap();
            // A re-login replaces any existing session and its monitor.
            cell.monitor = Some(monitor::spawn(
                Arc::clone(&self.inner),
                self.inner.settings.monitor_period,
            ));
            cell.snapshot = Some(SessionSnapshot {
                role,
                name,
                user_id,
                expires_at,
            });
            cell.pending_reason = None;
            cell.state = if soon {
                SessionState::ExpiringSoon
            } else {
                SessionState::Authenticated
            };
        }
        let _ = self.inner.signals_tx.send(SessionSignals {
            remaining_seconds: remaining,
            expiring_soon: soon,
        });
        self.inner.navigate(Screen::Dashboard, None);
        info!(role = %role, %expires_at, "login complete");
        Ok(())
    }

    /// User-initiated sign-out. Safe to call repeatedly; only the first call
    /// on an authenticated session has any effect.
    pub fn logout(&self) {
        self.inner.teardown(RedirectReason::Logout);
    }

    /// Manual re-entry into the validity check, e.g. after a window regains
    /// focus. Identical in behavior to a monitor tick.
    pub fn refresh_status(&self) {
        self.inner.check_session();
    }

    /// Cold-start reconciliation: validate any persisted credentials before
    /// anything renders. Valid credentials resume the session and start the
    /// monitor; invalid ones are cleared and leave a pending
    /// `session_expired` reason for the guard, with no navigation emitted
    /// (the process starts unauthenticated, so there is no transition).
    pub fn restore(&self) -> SessionState {
        let credentials = match self.inner.store.get() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                debug!("no persisted credentials");
                return SessionState::Unauthenticated;
            }
            Err(error) => {
                // A record survived but lost required fields; drop it so it
                // cannot shadow the next sign-in.
                debug!(%error, "persisted credentials incomplete, clearing");
                return self.discard_persisted();
            }
        };

        let now = self.inner.clock.now();
        let status = token::validate(&credentials.token, now);
        let Some(expires_at) = status.expires_at.filter(|_| status.is_valid) else {
            debug!(error = ?status.error, "persisted credentials invalid, clearing");
            return self.discard_persisted();
        };

        let remaining = token::remaining_seconds(&credentials.token, now);
        let soon = token::is_expiring_soon(
            &credentials.token,
            self.inner.settings.warning_threshold_minutes,
            now,
        );
        let state = if soon {
            SessionState::ExpiringSoon
        } else {
            SessionState::Authenticated
        };

        {
            let mut cell = self.inner.cell.lock().unwrap();
            cell.snapshot = Some(SessionSnapshot {
                role: credentials.role,
                name: credentials.name,
                user_id: credentials.user_id,
                expires_at,
            });
            cell.state = state;
            cell.monitor = Some(monitor::spawn(
                Arc::clone(&self.inner),
                self.inner.settings.monitor_period,
            ));
        }
        let _ = self.inner.signals_tx.send(SessionSignals {
            remaining_seconds: remaining,
            expiring_soon: soon,
        });
        info!(%expires_at, "session restored from storage");
        state
    }

    /// Drop unusable persisted credentials found at cold start and leave the
    /// `session_expired` reason for the guard to surface.
    fn discard_persisted(&self) -> SessionState {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to clear stale credentials");
        }
        let mut cell = self.inner.cell.lock().unwrap();
        cell.pending_reason = Some(RedirectReason::SessionExpired);
        SessionState::Unauthenticated
    }

    /// Stop the monitor without ending the session. For whole-app teardown.
    pub fn shutdown(&self) {
        let mut cell = self.inner.cell.lock().unwrap();
        if let Some(handle) = cell.monitor.take() {
            handle.stop();
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.cell.lock().unwrap().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Identity of the signed-in principal, when authenticated.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.inner.cell.lock().unwrap().snapshot.clone()
    }

    /// Subscribe to remaining-time / expiring-soon updates.
    pub fn signals(&self) -> watch::Receiver<SessionSignals> {
        self.inner.signals_tx.subscribe()
    }

    /// Consume the reason recorded by the most recent forced transition, if
    /// any. Used by the route guard so the sign-in surface shows the right
    /// banner exactly once.
    pub fn take_reason(&self) -> Option<RedirectReason> {
        self.inner.cell.lock().unwrap().pending_reason.take()
    }
}
