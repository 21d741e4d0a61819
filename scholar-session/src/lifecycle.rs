//! Single-flight request lifecycle
//!
//! Wraps the research service with a two-state machine (`Idle`,
//! `Pending`). Only one request may be outstanding; a second submission while
//! one is pending is refused, never queued. The guard lives here, so it holds
//! whoever the caller is.

use crate::service::ResearchService;
use crate::{SessionError, SessionResult};
use scholar_core::{validation_error, with_timeout, ResearchReport};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Current state of the lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Pending { task: String },
}

/// Why a task is being submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOrigin {
    /// Typed in by the user
    Fresh,
    /// Re-run by selecting an existing history entry
    History,
}

/// Successful outcome of a submission
#[derive(Debug, Clone)]
pub struct Completion {
    pub report: ResearchReport,
    pub origin: SubmitOrigin,
}

impl Completion {
    /// Only fresh submissions create history entries
    pub fn should_record_history(&self) -> bool {
        self.origin == SubmitOrigin::Fresh
    }
}

/// Request coordinator with one in-flight slot
#[derive(Clone)]
pub struct RequestLifecycle {
    service: Arc<dyn ResearchService>,
    state: Arc<Mutex<LifecycleState>>,
    timeout_ms: u64,
}

impl std::fmt::Debug for RequestLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLifecycle")
            .field("state", &self.state())
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Returns the lifecycle to `Idle` when dropped, including when the
/// submitting future is dropped mid-flight.
struct PendingSlot<'a> {
    state: &'a Mutex<LifecycleState>,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        *lock(self.state) = LifecycleState::Idle;
    }
}

fn lock(state: &Mutex<LifecycleState>) -> MutexGuard<'_, LifecycleState> {
    // The state is a plain enum; a panic elsewhere cannot leave it torn
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RequestLifecycle {
    pub fn new(service: Arc<dyn ResearchService>, timeout_ms: u64) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(LifecycleState::Idle)),
            timeout_ms,
        }
    }

    pub fn state(&self) -> LifecycleState {
        lock(&self.state).clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*lock(&self.state), LifecycleState::Pending { .. })
    }

    /// Submit a task to the research service.
    ///
    /// Blank tasks are rejected before anything is sent. While another
    /// request is pending this returns [`SessionError::InFlight`]. Service
    /// failures and timeouts are returned as errors and the lifecycle is back
    /// to `Idle` either way.
    pub async fn submit(&self, task: &str, origin: SubmitOrigin) -> SessionResult<Completion> {
        let task = task.trim();
        if task.is_empty() {
            return Err(validation_error!("Task must not be empty", "task", "request_lifecycle").into());
        }

        let _slot = self.claim(task)?;
        info!(task, ?origin, "Submitting research request");

        let report = with_timeout(self.service.research(task), self.timeout_ms, "research")
            .await
            .and_then(|result| result)
            .map_err(|e| {
                e.log();
                SessionError::from(e)
            })?;

        debug!(task, "Research request completed");
        Ok(Completion { report, origin })
    }

    fn claim(&self, task: &str) -> SessionResult<PendingSlot<'_>> {
        let mut state = lock(&self.state);
        if let LifecycleState::Pending { task: pending } = &*state {
            debug!(pending = %pending, refused = task, "Refusing overlapping submission");
            return Err(SessionError::InFlight {
                pending: pending.clone(),
            });
        }

        *state = LifecycleState::Pending {
            task: task.to_string(),
        };
        Ok(PendingSlot { state: &self.state })
    }
}
