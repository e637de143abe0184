//! Loading orchestrator - the loading/mount state machine.
//!
//! Drives a provider scope through:
//! ```text
//! Mounted --loading()--> Loading --complete()--> (mounting delay) --> Mounted
//! ```
//! The mounting delay is `max(min_loading - elapsed, 0) + delay`, where
//! `elapsed` is measured from the last time the scope started loading.
//!
//! `on_loaded` fires once per load cycle: from the mount sequence when
//! `complete()` drives the transition, or from the completion watcher when
//! the load was finished through the raw setter. `on_mount` fires on every
//! `is_component_mounted` false -> true edge, after the state has committed.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use orca_core::{
    ElapsedTimer, LoadPhase, LoadingConfig, LoadingConfigPatch, LoadingState, ObserverId, Result,
    StateChange,
};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::events::EventHandlers;
use crate::gate::{LoadItem, Rendered};
use crate::store::{lock, LoadingContext, StateObserver, StateUpdate};

/// Edge-detection memory, updated on every observed commit.
struct Edges {
    prev_is_loading: bool,
    prev_is_mounted: bool,
    /// `on_loaded` already fired for the current load cycle
    loaded_fired: bool,
}

#[derive(Default)]
struct PendingMount {
    generation: u64,
    handle: Option<AbortHandle>,
}

struct Inner {
    id: ObserverId,
    context: LoadingContext,
    runtime: Handle,
    config: Mutex<LoadingConfig>,
    timer: Mutex<ElapsedTimer>,
    handlers: Mutex<EventHandlers>,
    edges: Mutex<Edges>,
    pending: Arc<Mutex<PendingMount>>,
}

impl Inner {
    fn mounting_delay(&self) -> Duration {
        let elapsed = lock(&self.timer).get();
        lock(&self.config).mounting_delay(elapsed)
    }

    fn handlers(&self) -> EventHandlers {
        lock(&self.handlers).clone()
    }

    /// Fire `on_loaded` unless it already fired this cycle.
    fn fire_loaded_once(&self) {
        let first = {
            let mut edges = lock(&self.edges);
            !std::mem::replace(&mut edges.loaded_fired, true)
        };
        if first {
            self.handlers().fire_loaded();
        }
    }

    fn has_pending_mount(&self) -> bool {
        lock(&self.pending).handle.is_some()
    }

    /// Abort the scheduled mount, if any. Returns whether one was pending.
    fn cancel_pending_mount(&self) -> bool {
        let mut pending = lock(&self.pending);
        let Some(handle) = pending.handle.take() else {
            return false;
        };
        handle.abort();
        pending.generation += 1;
        debug!(scope = %self.context.id(), observer = %self.id, "pending mount cancelled");
        true
    }

    fn mount_component(self: &Arc<Self>) -> Result<()> {
        let mounting_delay = self.mounting_delay();

        // loaded lifecycle sits between load completion and the delayed mount
        self.fire_loaded_once();

        if mounting_delay.is_zero() {
            self.context.set_state(LoadingState::mounted())?;
            return Ok(());
        }

        self.schedule_mount(mounting_delay);
        Ok(())
    }

    fn schedule_mount(self: &Arc<Self>, delay: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(self);
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        let generation = pending.generation;

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.run_scheduled_mount(generation);
            }
        });
        pending.handle = Some(task.abort_handle());

        debug!(
            scope = %self.context.id(),
            observer = %self.id,
            delay_ms = delay.as_millis() as u64,
            "mount scheduled"
        );
    }

    fn run_scheduled_mount(&self, generation: u64) {
        // generation is checked under the scope lock, so a cancel either
        // lands first or observes the committed mount
        let pending = Arc::clone(&self.pending);
        let mount = StateUpdate::update(move |prev| {
            let mut pending = lock(&pending);
            if pending.generation != generation || pending.handle.is_none() {
                return prev;
            }
            pending.handle = None;
            LoadingState::mounted()
        });
        if let Err(e) = self.context.set_state(mount) {
            debug!(error = %e, "scheduled mount after scope was dropped");
        }
    }
}

impl StateObserver for Inner {
    fn state_changed(&self, change: &StateChange) {
        let next = change.next;
        let (just_started, just_loaded, just_mounted) = {
            let mut edges = lock(&self.edges);
            let just_started = next.is_loading && !edges.prev_is_loading;
            let just_loaded = !next.is_loading && edges.prev_is_loading;
            let just_mounted = next.is_component_mounted && !edges.prev_is_mounted;
            edges.prev_is_loading = next.is_loading;
            edges.prev_is_mounted = next.is_component_mounted;

            if just_started {
                edges.loaded_fired = false;
            }
            let fire_loaded = just_loaded && !edges.loaded_fired;
            if fire_loaded {
                edges.loaded_fired = true;
            }
            (just_started, fire_loaded, just_mounted)
        };

        if just_started {
            // back into loading: drop stale content and restart the minimum
            self.cancel_pending_mount();
            lock(&self.timer).reset();
            let unmount = StateUpdate::update(|prev| LoadingState {
                is_component_mounted: false,
                ..prev
            });
            if let Err(e) = self.context.set_state(unmount) {
                warn!(error = %e, "failed to unmount stale content");
            }
        } else if just_loaded {
            self.handlers().fire_loaded();
        }

        if just_mounted {
            self.handlers().fire_mount();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel_pending_mount();
        self.context.unobserve(self.id);
    }
}

/// Drives one view's loading transitions on a shared scope.
///
/// Cloning yields another handle to the same orchestrator. Dropping the
/// last handle cancels any pending mount.
#[derive(Clone)]
pub struct LoadingOrchestrator {
    inner: Arc<Inner>,
}

impl LoadingOrchestrator {
    /// Attach to a scope.
    ///
    /// `initial_load_value` is what the view assumes at creation: `true`
    /// when it starts out loading. Must be called inside a tokio runtime,
    /// which also runs the mount timers.
    pub fn new(context: &LoadingContext, initial_load_value: bool) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let config = context.config()?;

        let inner = Arc::new(Inner {
            id: ObserverId::new(),
            context: context.clone(),
            runtime,
            config: Mutex::new(config),
            timer: Mutex::new(ElapsedTimer::new()),
            handlers: Mutex::new(EventHandlers::default()),
            edges: Mutex::new(Edges {
                prev_is_loading: initial_load_value,
                prev_is_mounted: !initial_load_value,
                loaded_fired: false,
            }),
            pending: Arc::new(Mutex::new(PendingMount::default())),
        });

        let observer: Weak<dyn StateObserver> = Arc::downgrade(&inner) as Weak<dyn StateObserver>;
        context.observe(inner.id, observer)?;

        debug!(scope = %context.id(), observer = %inner.id, "orchestrator attached");
        Ok(Self { inner })
    }

    /// Enter the loading phase, merging `patch` into this orchestrator's config.
    ///
    /// No-op while already loading with nothing mounted, so repeated calls
    /// never restart the minimum-loading clock mid-flight. A mount still
    /// waiting out its delay is cancelled either way: a refetch issued
    /// during the settle window keeps the fallback up, and the next
    /// `complete()` reports the load again.
    pub fn loading(&self, patch: Option<LoadingConfigPatch>) -> Result<()> {
        if self.inner.cancel_pending_mount() {
            lock(&self.inner.edges).loaded_fired = false;
        }

        let state = self.inner.context.state()?;
        if state.is_loading_fresh() {
            debug!(scope = %self.inner.context.id(), "already loading");
            return Ok(());
        }

        if let Some(patch) = patch {
            lock(&self.inner.config).merge(&patch);
        }
        self.inner.context.set_state(LoadingState::loading())?;
        Ok(())
    }

    /// Leave the loading phase once the mounting delay has passed.
    ///
    /// No-op when already settled and mounted, or when a mount is already
    /// scheduled.
    pub fn complete(&self) -> Result<()> {
        let state = self.inner.context.state()?;
        if state.is_settled() {
            debug!(scope = %self.inner.context.id(), "already mounted");
            return Ok(());
        }
        if self.inner.has_pending_mount() {
            debug!(scope = %self.inner.context.id(), "mount already scheduled");
            return Ok(());
        }
        self.inner.mount_component()
    }

    /// Render through the gate, registering its callbacks as the current pair.
    pub fn load_item<T>(&self, item: LoadItem<T>) -> Result<Rendered<T>> {
        let LoadItem {
            children,
            fallback,
            on_mount,
            on_loaded,
            is_loaded,
        } = item;
        *lock(&self.inner.handlers) = EventHandlers {
            on_loaded,
            on_mount,
        };

        let state = self.inner.context.state()?;
        if state.is_component_mounted {
            return Ok(Rendered::Content(children));
        }

        if is_loaded {
            let just_loaded = lock(&self.inner.edges).prev_is_loading;
            if just_loaded && self.inner.mounting_delay().is_zero() {
                debug!(scope = %self.inner.context.id(), "rendering content ahead of mount");
            }
            return Ok(Rendered::Content(children));
        }

        let fallback = match fallback {
            Some(fallback) => fallback,
            None => self.inner.context.fallback()?,
        };
        // settle window: on_loaded has fired, the mount has not
        if lock(&self.inner.edges).loaded_fired {
            return Ok(Rendered::Fallback(fallback.with_fade_out()));
        }
        Ok(Rendered::Fallback(fallback))
    }

    /// Current scope state.
    pub fn state(&self) -> Result<LoadingState> {
        self.inner.context.state()
    }

    /// Current scope phase.
    pub fn phase(&self) -> Result<LoadPhase> {
        Ok(self.state()?.phase())
    }

    /// This orchestrator's merged configuration.
    pub fn config(&self) -> LoadingConfig {
        *lock(&self.inner.config)
    }

    /// Delay a `complete()` issued now would wait before mounting.
    pub fn mounting_delay(&self) -> Duration {
        self.inner.mounting_delay()
    }

    /// Time since the scope last started loading.
    pub fn elapsed(&self) -> Duration {
        lock(&self.inner.timer).get()
    }

    /// Whether a delayed mount is waiting to fire.
    pub fn has_pending_mount(&self) -> bool {
        self.inner.has_pending_mount()
    }

    /// Scope handle.
    pub fn context(&self) -> &LoadingContext {
        &self.inner.context
    }
}

impl std::fmt::Debug for LoadingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingOrchestrator")
            .field("id", &self.inner.id)
            .field("scope", &self.inner.context.id())
            .field("config", &self.config())
            .finish()
    }
}
