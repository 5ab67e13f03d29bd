//! Recurring session check, owned by the controller.
//!
//! One timer per authenticated session. Each tick re-reads the credential
//! store and funnels into the controller's shared validity check; the task
//! ends on its own once the session is gone, and the handle aborts it on
//! logout or whole-app teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::controller::Inner;

/// Handle to the running monitor task. Stopping (or dropping) the handle
/// cancels the timer so a finished session cannot keep ticking.
pub(crate) struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub(crate) fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn spawn(inner: Arc<Inner>, period: Duration) -> MonitorHandle {
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The interval fires immediately; login/restore already published
        // fresh signals, so consume the first tick without checking.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !inner.check_session() {
                debug!("session monitor stopping");
                break;
            }
        }
    });
    MonitorHandle { task }
}
