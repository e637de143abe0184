//! Loading state model - the two flags shared by a provider scope.

use serde::{Deserialize, Serialize};

/// Shared loading flags for one provider scope.
///
/// The flags are not independent: `is_component_mounted` only becomes true
/// after `is_loading` drops from true to false, and entering loading always
/// clears it on the next settle. The store does not enforce this; the
/// orchestrator does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingState {
    /// An operation is in flight or queued
    pub is_loading: bool,

    /// Loaded content is what is being rendered
    pub is_component_mounted: bool,
}

impl LoadingState {
    /// State a view starts in: loading with nothing mounted, or already mounted.
    pub fn initial(initial_load_value: bool) -> Self {
        Self {
            is_loading: initial_load_value,
            is_component_mounted: !initial_load_value,
        }
    }

    /// Loading, content not mounted.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            is_component_mounted: false,
        }
    }

    /// Settled and mounted.
    pub fn mounted() -> Self {
        Self {
            is_loading: false,
            is_component_mounted: true,
        }
    }

    /// Conceptual phase derived from the two flags.
    pub fn phase(&self) -> LoadPhase {
        LoadPhase::from(*self)
    }

    /// Already loading and not showing stale content.
    pub fn is_loading_fresh(&self) -> bool {
        self.is_loading && !self.is_component_mounted
    }

    /// Fully settled with content mounted.
    pub fn is_settled(&self) -> bool {
        !self.is_loading && self.is_component_mounted
    }
}

impl Default for LoadingState {
    fn default() -> Self {
        Self::initial(true)
    }
}

/// Phase of a scope, derived from [`LoadingState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadPhase {
    /// Content visible, nothing in flight
    Mounted,
    /// In flight, fallback visible
    Loading,
    /// Load finished, waiting for the mounting delay
    Settling,
    /// Re-entering loading while old content still reports mounted
    Remounting,
}

impl From<LoadingState> for LoadPhase {
    fn from(state: LoadingState) -> Self {
        match (state.is_loading, state.is_component_mounted) {
            (false, true) => LoadPhase::Mounted,
            (true, false) => LoadPhase::Loading,
            (false, false) => LoadPhase::Settling,
            (true, true) => LoadPhase::Remounting,
        }
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPhase::Mounted => write!(f, "mounted"),
            LoadPhase::Loading => write!(f, "loading"),
            LoadPhase::Settling => write!(f, "settling"),
            LoadPhase::Remounting => write!(f, "remounting"),
        }
    }
}

/// A committed change of a scope's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// Value before the commit
    pub prev: LoadingState,

    /// Value after the commit
    pub next: LoadingState,
}

impl StateChange {
    /// `is_loading` went false -> true.
    pub fn started_loading(&self) -> bool {
        !self.prev.is_loading && self.next.is_loading
    }

    /// `is_loading` went true -> false.
    pub fn finished_loading(&self) -> bool {
        self.prev.is_loading && !self.next.is_loading
    }

    /// `is_component_mounted` went false -> true.
    pub fn mounted(&self) -> bool {
        !self.prev.is_component_mounted && self.next.is_component_mounted
    }

    /// Whether the commit changed anything.
    pub fn is_noop(&self) -> bool {
        self.prev == self.next
    }
}
