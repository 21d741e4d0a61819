//! Scholar Core - report model and shared infrastructure
//!
//! Defines the research report data model together with the error type,
//! logging setup and configuration used by the rest of the workspace.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
