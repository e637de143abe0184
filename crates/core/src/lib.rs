//! Orca core data models.
//!
//! This crate defines the state, configuration and timing types shared by
//! the loading orchestration layer of the workflow client.

#![warn(missing_docs)]

// Identities
mod id;

// Loading scope model
mod state;
mod config;
mod timer;
mod fallback;

// Data-fetch collaborator
mod query;

mod error;

// Re-exports
pub use id::*;

pub use state::{LoadingState, LoadPhase, StateChange};
pub use config::{LoadingConfig, LoadingConfigPatch, FADE_OUT_DELAY, MIN_LOADING};
pub use timer::ElapsedTimer;
pub use fallback::{FallbackVisual, DEFAULT_MESSAGE};
pub use query::QueryStatus;
pub use error::{ConfigError, ConfigResult, LoadingError, QueryError, Result};
