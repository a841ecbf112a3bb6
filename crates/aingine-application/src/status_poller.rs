//! StatusPoller - periodic health probes.
//!
//! The poller is the only writer of `system_status` and `gpu_locked`, and the
//! authoritative writer of `current_model_id`. Each tick awaits its probe
//! before the next tick is taken, and ticks that fall due during a slow probe
//! are skipped. Probes from the loop and from [`StatusPoller::poll_once`]
//! share one lock, so at most one probe is outstanding per session.

use std::sync::Arc;
use std::time::Duration;

use aingine_core::gateway::Gateway;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::session::SessionState;

/// Drives health probes for one session.
#[derive(Clone)]
pub struct StatusPoller {
    state: Arc<SessionState>,
    gateway: Arc<dyn Gateway>,
    interval: Duration,
    probe_lock: Arc<Mutex<()>>,
}

impl StatusPoller {
    pub fn new(state: Arc<SessionState>, gateway: Arc<dyn Gateway>, interval: Duration) -> Self {
        Self {
            state,
            gateway,
            interval,
            probe_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs one probe and applies its result.
    ///
    /// Waits for any probe already in flight, including one started by the
    /// polling loop.
    pub async fn poll_once(&self) {
        let _probe = self.probe_lock.lock().await;
        let report = self.gateway.check_health().await;
        tracing::trace!(
            status = %report.status,
            current_model = ?report.current_model_id,
            gpu_locked = report.gpu_locked,
            "Health probe resolved"
        );
        self.state.apply_health(&report);
    }

    /// Starts polling. The first probe fires immediately.
    ///
    /// Polling stops when the returned handle is stopped or dropped.
    pub fn start(&self) -> PollerHandle {
        let token = CancellationToken::new();
        let poller = self.clone();
        let child = token.clone();

        let join = tokio::spawn(async move {
            let mut ticker = interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(
                client_id = %poller.state.client_id(),
                "Status poller started ({}s interval)",
                poller.interval.as_secs_f64()
            );

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // A probe in flight at teardown is abandoned, never applied
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = poller.poll_once() => {}
                }
            }

            tracing::debug!(client_id = %poller.state.client_id(), "Status poller stopped");
        });

        PollerHandle {
            token,
            join: Some(join),
        }
    }
}

/// Owner of a running poll loop.
#[derive(Debug)]
pub struct PollerHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Cancels the loop and waits for it to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!("Status poller task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
