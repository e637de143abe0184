//! Lifecycle callbacks registered by the render gate.

use std::sync::Arc;

/// A lifecycle callback.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Wrap a closure as a [`Callback`].
pub fn callback(f: impl Fn() + Send + Sync + 'static) -> Callback {
    Arc::new(f)
}

/// The current `on_loaded`/`on_mount` pair of an orchestrator.
///
/// This is a single slot, not a listener list: every render of the gate
/// replaces both entries, including clearing one the caller omitted.
#[derive(Clone, Default)]
pub struct EventHandlers {
    /// Data is ready; fires before the mounting delay
    pub on_loaded: Option<Callback>,

    /// Content mounted; fires after the state commits
    pub on_mount: Option<Callback>,
}

impl EventHandlers {
    pub(crate) fn fire_loaded(&self) {
        if let Some(on_loaded) = &self.on_loaded {
            on_loaded();
        }
    }

    pub(crate) fn fire_mount(&self) {
        if let Some(on_mount) = &self.on_mount {
            on_mount();
        }
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_loaded", &self.on_loaded.is_some())
            .field("on_mount", &self.on_mount.is_some())
            .finish()
    }
}
