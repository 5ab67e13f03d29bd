//! ClinicDesk session shell.
//!
//! Headless driver for the session core: restores any persisted session,
//! signs in with environment-provided credentials when there is none, and
//! then follows navigation and expiry signals until the session ends. The
//! clinic screens themselves live elsewhere; this binary exercises the
//! lifecycle they all depend on.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clinicdesk::api::AuthClient;
use clinicdesk::auth::{guard, FileStore, Screen, SessionController, SystemClock};
use clinicdesk::config::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("ClinicDesk session shell starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let storage_dir = config
        .storage_dir()
        .context("could not resolve credential storage directory")?;
    let store = Arc::new(FileStore::new(storage_dir)?);
    let clock = Arc::new(SystemClock);
    let (controller, mut nav_rx) =
        SessionController::with_settings(store, clock, config.session_settings());

    // Cold start: reconcile persisted credentials before anything renders.
    let state = controller.restore();
    info!(?state, "session state restored");

    if !controller.is_authenticated() {
        if let guard::GuardDecision::Redirect { reason, .. } =
            guard::check(&controller, Screen::Dashboard)
        {
            info!(reason = ?reason.map(|r| r.as_str()), "sign-in required");
        }

        let email = std::env::var("CLINICDESK_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone());
        let password = std::env::var("CLINICDESK_PASSWORD").ok();
        let (Some(email), Some(password)) = (email, password) else {
            error!("no credentials available; set CLINICDESK_EMAIL and CLINICDESK_PASSWORD");
            return Ok(());
        };

        let api = AuthClient::new(config.api_base_url.clone())?;
        let account = match api.login(&email, &password).await {
            Ok(account) => account,
            Err(e) => {
                // Surfaced verbatim, never retried automatically.
                error!(error = %e, "login failed");
                return Ok(());
            }
        };

        controller
            .login(
                account.token.clone(),
                account.role,
                account.name.clone(),
                account.user_id(),
            )
            .map_err(|e| anyhow::anyhow!("auth API response could not start a session: {e}"))?;

        config.last_email = Some(email);
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    if let Some(snapshot) = controller.snapshot() {
        info!(
            name = %snapshot.name,
            role = %snapshot.role,
            expires_at = %snapshot.expires_at,
            "signed in"
        );
    }

    let mut signals = controller.signals();
    loop {
        tokio::select! {
            nav = nav_rx.recv() => {
                match nav {
                    Some(nav) if nav.target == Screen::Login => {
                        info!(location = %nav.location(), "session ended, redirecting");
                        break;
                    }
                    Some(nav) => info!(location = %nav.location(), "navigating"),
                    None => break,
                }
            }
            changed = signals.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *signals.borrow();
                if current.expiring_soon {
                    warn!(
                        remaining_seconds = current.remaining_seconds,
                        "session expiring soon"
                    );
                }
            }
        }
    }

    controller.shutdown();
    info!("ClinicDesk session shell stopped");
    Ok(())
}
