//! Per-client session state.
//!
//! `SessionState` is the serialization point for the three writers:
//!
//! | Field              | Writer                                           |
//! |--------------------|--------------------------------------------------|
//! | `system_status`    | `StatusPoller`                                   |
//! | `gpu_locked`       | `StatusPoller`                                   |
//! | `current_model_id` | `StatusPoller` (authoritative), swap (optimistic)|
//! | `activity`         | `ModelSwapController` / `ChatController`         |
//! | message log        | `ModelSwapController` / `ChatController`         |
//!
//! The writer methods are crate-private, so nothing outside this crate can
//! mutate the state except through the poller and the controllers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use aingine_core::gateway::{HealthReport, ResponseSource, SystemStatus};
use aingine_core::model::ModelConfig;
use aingine_core::session::{Message, MessageLog};
use tokio::sync::watch;
use uuid::Uuid;

/// This client's own in-flight operation.
///
/// A single enum makes "swapping and generating at once" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Swapping {
        model_id: String,
    },
    Generating,
}

/// Why a model select was not accepted. Rejections never reach the network
/// and never append to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapRejection {
    AlreadySwapping,
    Generating,
    GpuLocked,
    AlreadyActive,
    UnknownModel(String),
}

/// Why a chat submission was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRejection {
    EmptyPrompt,
    NoModelLoaded,
    Swapping,
    Generating,
}

/// Point-in-time copy of the session's scalar fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub client_id: Uuid,
    pub system_status: SystemStatus,
    pub current_model_id: Option<String>,
    pub gpu_locked: bool,
    pub activity: Activity,
    pub message_count: usize,
}

impl SessionSnapshot {
    pub fn is_swapping(&self) -> bool {
        matches!(self.activity, Activity::Swapping { .. })
    }

    pub fn is_generating(&self) -> bool {
        self.activity == Activity::Generating
    }

    /// Whether a chat submission would currently be accepted.
    pub fn is_model_ready(&self) -> bool {
        self.current_model_id.is_some() && self.activity == Activity::Idle
    }
}

#[derive(Debug, Default)]
struct Inner {
    system_status: SystemStatus,
    current_model_id: Option<String>,
    gpu_locked: bool,
    activity: Activity,
    log: MessageLog,
}

/// Shared state for one client session.
#[derive(Debug)]
pub struct SessionState {
    client_id: Uuid,
    inner: Mutex<Inner>,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    /// Fresh state: offline, no model, idle, empty log.
    pub fn new() -> Self {
        let client_id = Uuid::new_v4();
        let inner = Inner::default();
        let (updates, _) = watch::channel(Self::snapshot_of(client_id, &inner));
        Self {
            client_id,
            inner: Mutex::new(inner),
            updates,
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        Self::snapshot_of(self.client_id, &self.lock())
    }

    /// Full copy of the message log.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().log.entries().to_vec()
    }

    /// Messages appended after the first `seen` ones.
    pub fn messages_since(&self, seen: usize) -> Vec<Message> {
        self.lock().log.since(seen).to_vec()
    }

    /// Receiver notified after every change, including message appends.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    // ========================================================================
    // StatusPoller
    // ========================================================================

    /// Overwrites the gateway-reported fields with a probe result.
    ///
    /// Unconditional: an optimistic `current_model_id` from a swap may be
    /// rolled back here until the next probe after the swap converges.
    pub(crate) fn apply_health(&self, report: &HealthReport) {
        self.mutate(|inner| {
            inner.system_status = report.status;
            inner.current_model_id = report.current_model_id.clone();
            inner.gpu_locked = report.gpu_locked;
        });
    }

    // ========================================================================
    // ModelSwapController
    // ========================================================================

    /// Checks the select guard and, if it passes, enters `Swapping` and
    /// appends the announcement produced by `announce(current_model_id)`.
    pub(crate) fn begin_swap<F>(&self, model: &ModelConfig, announce: F) -> Result<(), SwapRejection>
    where
        F: FnOnce(Option<&str>) -> String,
    {
        self.try_mutate(|inner| {
            match inner.activity {
                Activity::Swapping { .. } => return Err(SwapRejection::AlreadySwapping),
                Activity::Generating => return Err(SwapRejection::Generating),
                Activity::Idle => {}
            }
            if inner.gpu_locked {
                return Err(SwapRejection::GpuLocked);
            }
            if inner.current_model_id.as_deref() == Some(model.id.as_str()) {
                return Err(SwapRejection::AlreadyActive);
            }

            let announcement = announce(inner.current_model_id.as_deref());
            inner.log.push_notice(announcement);
            inner.activity = Activity::Swapping {
                model_id: model.id.clone(),
            };
            Ok(())
        })
    }

    pub(crate) fn finish_swap_success(&self, model_id: &str, notice: String) {
        self.mutate(|inner| {
            Self::expect_activity(inner, "swap");
            inner.current_model_id = Some(model_id.to_string());
            inner.log.push_notice(notice);
            inner.activity = Activity::Idle;
        });
    }

    pub(crate) fn finish_swap_failure(&self, error: String) {
        self.mutate(|inner| {
            Self::expect_activity(inner, "swap");
            inner.log.push_error(error);
            inner.activity = Activity::Idle;
        });
    }

    // ========================================================================
    // ChatController
    // ========================================================================

    /// Checks the chat guard and, if it passes, appends the user message and
    /// enters `Generating`.
    pub(crate) fn begin_generate(&self, prompt: &str) -> Result<(), ChatRejection> {
        self.try_mutate(|inner| {
            if prompt.trim().is_empty() {
                return Err(ChatRejection::EmptyPrompt);
            }
            match inner.activity {
                Activity::Swapping { .. } => return Err(ChatRejection::Swapping),
                Activity::Generating => return Err(ChatRejection::Generating),
                Activity::Idle => {}
            }
            if inner.current_model_id.is_none() {
                return Err(ChatRejection::NoModelLoaded);
            }

            inner.log.push_user(prompt);
            inner.activity = Activity::Generating;
            Ok(())
        })
    }

    pub(crate) fn finish_generate_success(&self, reply: String, source: ResponseSource) {
        self.mutate(|inner| {
            Self::expect_activity(inner, "generate");
            inner.log.push_reply(reply, source);
            inner.activity = Activity::Idle;
        });
    }

    pub(crate) fn finish_generate_failure(&self, error: String) {
        self.mutate(|inner| {
            Self::expect_activity(inner, "generate");
            inner.log.push_error(error);
            inner.activity = Activity::Idle;
        });
    }

    /// Returns to `Idle` with an error entry if an operation is still in
    /// flight. Called when a controller future is dropped before it resolves.
    pub(crate) fn abandon_operation(&self, error: &str) {
        self.mutate(|inner| {
            if inner.activity != Activity::Idle {
                tracing::warn!(
                    client_id = %self.client_id,
                    activity = ?inner.activity,
                    "Operation dropped before completion"
                );
                inner.log.push_error(error);
                inner.activity = Activity::Idle;
            }
        });
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Inner),
    {
        let mut inner = self.lock();
        f(&mut inner);
        self.updates
            .send_replace(Self::snapshot_of(self.client_id, &inner));
    }

    /// Like `mutate`, but only publishes when `f` succeeds.
    fn try_mutate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Inner) -> Result<T, E>,
    {
        let mut inner = self.lock();
        let result = f(&mut inner)?;
        self.updates
            .send_replace(Self::snapshot_of(self.client_id, &inner));
        Ok(result)
    }

    fn expect_activity(inner: &Inner, operation: &str) {
        let matches = match operation {
            "generate" => inner.activity == Activity::Generating,
            _ => matches!(inner.activity, Activity::Swapping { .. }),
        };
        if !matches {
            tracing::warn!(
                activity = ?inner.activity,
                "Finishing {} while not in that state",
                operation
            );
        }
    }

    fn snapshot_of(client_id: Uuid, inner: &Inner) -> SessionSnapshot {
        SessionSnapshot {
            client_id,
            system_status: inner.system_status,
            current_model_id: inner.current_model_id.clone(),
            gpu_locked: inner.gpu_locked,
            activity: inner.activity.clone(),
            message_count: inner.log.len(),
        }
    }
}

/// Entry appended when an accepted swap or generate is dropped mid-flight.
pub(crate) const CANCELLED_NOTICE: &str = "Error: Request was cancelled.";

/// Held by a controller between the guard check and the result.
///
/// Dropping it without [`InFlight::disarm`] releases the busy flag, so a
/// caller that abandons the future (timeout, `select!`, task abort) cannot
/// leave the session stuck.
pub(crate) struct InFlight<'a> {
    state: &'a SessionState,
    armed: bool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn new(state: &'a SessionState) -> Self {
        Self { state, armed: true }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.abandon_operation(CANCELLED_NOTICE);
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
