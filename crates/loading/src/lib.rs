//! Loading orchestration (Layer 2)
//!
//! Provider scopes, the loading/mount state machine, the render gate and
//! the glue that connects data-fetch status and toasts to it.

#![warn(missing_docs)]

pub mod store;
pub mod events;
pub mod gate;
pub mod orchestrator;
pub mod bridge;
pub mod toast;

pub use store::{LoadingContext, LoadingProvider, StateUpdate};
pub use events::{callback, Callback, EventHandlers};
pub use gate::{LoadItem, Rendered};
pub use orchestrator::LoadingOrchestrator;
pub use bridge::{ErrorPolicy, QueryBridge, QuerySource};
pub use toast::{Toast, ToastCenter, ToastStatus, TOAST_ID};
