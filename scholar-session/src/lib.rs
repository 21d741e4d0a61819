//! Scholar Session - history, request lifecycle and research service client
//!
//! This crate owns all state that changes while a user works with research
//! reports:
//!
//! - [`SessionStore`]: deduplicated, searchable history of past queries
//! - [`RequestLifecycle`]: single-flight wrapper around the research service
//! - [`ResearchSession`]: the facade a presentation layer drives
//!
//! The research service itself is an external collaborator reached through
//! the [`ResearchService`] trait.

pub mod lifecycle;
pub mod service;
pub mod session;
pub mod store;

pub use lifecycle::{Completion, LifecycleState, RequestLifecycle, SubmitOrigin};
pub use service::{HttpResearchService, ResearchService};
pub use session::ResearchSession;
pub use store::{AddOutcome, Filter, HistoryEntry, HistoryId, SessionStore, StoreSignal};

use scholar_core::ScholarError;

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] ScholarError),

    #[error("A research request for \"{pending}\" is already in progress")]
    InFlight { pending: String },
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Core(error) => error.user_message(),
            SessionError::InFlight { .. } => {
                "Please wait for the current research request to finish".to_string()
            }
        }
    }
}
