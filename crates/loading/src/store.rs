//! Provider scope holding the shared loading state.
//!
//! A [`LoadingProvider`] owns one scope. Consumers receive a
//! [`LoadingContext`] handle; once the provider is dropped every handle
//! operation fails with [`LoadingError::ProviderDropped`].
//!
//! Commits are dispatched to observers in commit order. A set issued while
//! observers are running (for example from inside a watcher) is queued and
//! dispatched after the current change, never nested.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use orca_core::{
    FallbackVisual, LoadingConfig, LoadingError, LoadingState, ObserverId, Result, ScopeId,
    StateChange,
};
use tokio::sync::watch;
use tracing::debug;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Setter argument: a literal value or a function of the previous value.
pub enum StateUpdate {
    /// Replace the whole state
    Replace(LoadingState),

    /// Derive the new state from the latest committed one
    Update(Box<dyn FnOnce(LoadingState) -> LoadingState + Send>),
}

impl StateUpdate {
    /// Functional update. The closure runs while the scope is locked and
    /// must not touch the scope itself.
    pub fn update(f: impl FnOnce(LoadingState) -> LoadingState + Send + 'static) -> Self {
        StateUpdate::Update(Box::new(f))
    }

    fn apply(self, prev: LoadingState) -> LoadingState {
        match self {
            StateUpdate::Replace(next) => next,
            StateUpdate::Update(f) => f(prev),
        }
    }
}

impl From<LoadingState> for StateUpdate {
    fn from(state: LoadingState) -> Self {
        StateUpdate::Replace(state)
    }
}

impl std::fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateUpdate::Replace(state) => f.debug_tuple("Replace").field(state).finish(),
            StateUpdate::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Receives every committed change of a scope.
pub(crate) trait StateObserver: Send + Sync {
    fn state_changed(&self, change: &StateChange);
}

#[derive(Default)]
struct Dispatch {
    queue: VecDeque<StateChange>,
    running: bool,
}

struct Scope {
    id: ScopeId,
    config: LoadingConfig,
    fallback: FallbackVisual,
    state: Mutex<LoadingState>,
    dispatch: Mutex<Dispatch>,
    observers: Mutex<Vec<(ObserverId, Weak<dyn StateObserver>)>>,
    watch_tx: watch::Sender<LoadingState>,
}

impl Scope {
    fn set_state(&self, update: StateUpdate) -> StateChange {
        let change = {
            let mut state = lock(&self.state);
            let prev = *state;
            let next = update.apply(prev);
            *state = next;

            let change = StateChange { prev, next };
            if !change.is_noop() {
                // queued under the state lock so dispatch order is commit order
                lock(&self.dispatch).queue.push_back(change);
                self.watch_tx.send_replace(next);
            }
            change
        };

        if change.is_noop() {
            return change;
        }

        debug!(
            scope = %self.id,
            from = %change.prev.phase(),
            to = %change.next.phase(),
            "loading state committed"
        );
        self.drain();
        change
    }

    fn drain(&self) {
        {
            let mut dispatch = lock(&self.dispatch);
            if dispatch.running {
                return;
            }
            dispatch.running = true;
        }
        let guard = DrainGuard(&self.dispatch);

        loop {
            let change = {
                let mut dispatch = lock(&self.dispatch);
                match dispatch.queue.pop_front() {
                    Some(change) => change,
                    None => {
                        // cleared under the same lock that saw the queue empty
                        dispatch.running = false;
                        break;
                    }
                }
            };
            for observer in self.live_observers() {
                observer.state_changed(&change);
            }
        }
        std::mem::forget(guard);
    }

    fn live_observers(&self) -> Vec<Arc<dyn StateObserver>> {
        let mut observers = lock(&self.observers);
        observers.retain(|(_, weak)| weak.strong_count() > 0);
        observers
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }
}

/// Releases the drainer slot if an observer panics.
struct DrainGuard<'a>(&'a Mutex<Dispatch>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).running = false;
    }
}

/// Owner of a provider scope.
pub struct LoadingProvider {
    scope: Arc<Scope>,
}

impl LoadingProvider {
    /// Create a scope that starts in the loading phase.
    pub fn new(config: LoadingConfig, fallback: FallbackVisual) -> Self {
        let initial = LoadingState::initial(true);
        let (watch_tx, _) = watch::channel(initial);
        let scope = Scope {
            id: ScopeId::new(),
            config,
            fallback,
            state: Mutex::new(initial),
            dispatch: Mutex::new(Dispatch::default()),
            observers: Mutex::new(Vec::new()),
            watch_tx,
        };
        debug!(scope = %scope.id, ?config, "loading provider created");
        Self {
            scope: Arc::new(scope),
        }
    }

    /// Start from a specific state instead of loading.
    pub fn with_state(self, state: LoadingState) -> Self {
        *lock(&self.scope.state) = state;
        self.scope.watch_tx.send_replace(state);
        self
    }

    /// Scope identifier.
    pub fn id(&self) -> ScopeId {
        self.scope.id
    }

    /// Handle for consumers of this scope.
    pub fn context(&self) -> LoadingContext {
        LoadingContext {
            id: self.scope.id,
            scope: Arc::downgrade(&self.scope),
        }
    }

    /// Current state.
    pub fn state(&self) -> LoadingState {
        *lock(&self.scope.state)
    }

    /// Provider configuration.
    pub fn config(&self) -> LoadingConfig {
        self.scope.config
    }
}

impl Default for LoadingProvider {
    fn default() -> Self {
        Self::new(LoadingConfig::default(), FallbackVisual::default())
    }
}

impl Drop for LoadingProvider {
    fn drop(&mut self) {
        debug!(scope = %self.scope.id, "loading provider dropped");
    }
}

/// Consumer handle to a provider scope.
#[derive(Clone)]
pub struct LoadingContext {
    id: ScopeId,
    scope: Weak<Scope>,
}

impl LoadingContext {
    fn scope(&self) -> Result<Arc<Scope>> {
        self.scope
            .upgrade()
            .ok_or(LoadingError::ProviderDropped(self.id))
    }

    /// Scope identifier.
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Whether the provider is still alive.
    pub fn is_alive(&self) -> bool {
        self.scope.strong_count() > 0
    }

    /// Current state.
    pub fn state(&self) -> Result<LoadingState> {
        Ok(*lock(&self.scope()?.state))
    }

    /// Provider configuration.
    pub fn config(&self) -> Result<LoadingConfig> {
        Ok(self.scope()?.config)
    }

    /// Default fallback visual.
    pub fn fallback(&self) -> Result<FallbackVisual> {
        Ok(self.scope()?.fallback.clone())
    }

    /// Commit a new state and notify observers.
    pub fn set_state(&self, update: impl Into<StateUpdate>) -> Result<StateChange> {
        Ok(self.scope()?.set_state(update.into()))
    }

    /// Watch the state from outside the scope.
    pub fn subscribe(&self) -> Result<watch::Receiver<LoadingState>> {
        Ok(self.scope()?.watch_tx.subscribe())
    }

    pub(crate) fn observe(&self, id: ObserverId, observer: Weak<dyn StateObserver>) -> Result<()> {
        lock(&self.scope()?.observers).push((id, observer));
        Ok(())
    }

    pub(crate) fn unobserve(&self, id: ObserverId) {
        if let Some(scope) = self.scope.upgrade() {
            lock(&scope.observers).retain(|(observer_id, _)| *observer_id != id);
        }
    }
}

impl std::fmt::Debug for LoadingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingContext")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Mutex<Vec<StateChange>>,
    }

    impl StateObserver for Recorder {
        fn state_changed(&self, change: &StateChange) {
            lock(&self.seen).push(*change);
        }
    }

    /// Re-enters the scope from inside a notification.
    struct Reentrant {
        context: LoadingContext,
        seen: Mutex<Vec<StateChange>>,
    }

    impl StateObserver for Reentrant {
        fn state_changed(&self, change: &StateChange) {
            lock(&self.seen).push(*change);
            if change.started_loading() {
                let inner = self.context.set_state(StateUpdate::update(|prev| LoadingState {
                    is_component_mounted: false,
                    ..prev
                }));
                // queued, so the outer change is still the last one seen here
                assert!(inner.is_ok());
                assert_eq!(lock(&self.seen).len(), 1);
            }
        }
    }

    #[test]
    fn test_setter_forms() {
        let provider = LoadingProvider::default();
        let context = provider.context();

        context.set_state(LoadingState::mounted()).unwrap();
        assert_eq!(provider.state(), LoadingState::mounted());

        let change = context
            .set_state(StateUpdate::update(|prev| LoadingState {
                is_loading: true,
                ..prev
            }))
            .unwrap();
        assert_eq!(change.prev, LoadingState::mounted());
        assert!(change.next.is_loading);
        assert!(change.next.is_component_mounted);
    }

    #[test]
    fn test_observers_see_commits_in_order() {
        let provider = LoadingProvider::default();
        let context = provider.context();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let weak: Weak<dyn StateObserver> = Arc::downgrade(&recorder) as Weak<dyn StateObserver>;
        context.observe(ObserverId::new(), weak).unwrap();

        context.set_state(LoadingState::mounted()).unwrap();
        context.set_state(LoadingState::mounted()).unwrap();
        context.set_state(LoadingState::loading()).unwrap();

        let seen = lock(&recorder.seen);
        // the repeated commit is a no-op and is not dispatched
        assert_eq!(seen.len(), 2);
        assert!(seen[0].mounted());
        assert!(seen[1].started_loading());
    }

    #[test]
    fn test_reentrant_set_is_queued() {
        let provider = LoadingProvider::default().with_state(LoadingState::mounted());
        let context = provider.context();
        let observer = Arc::new(Reentrant {
            context: context.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let weak: Weak<dyn StateObserver> = Arc::downgrade(&observer) as Weak<dyn StateObserver>;
        context.observe(ObserverId::new(), weak).unwrap();

        context
            .set_state(LoadingState {
                is_loading: true,
                is_component_mounted: true,
            })
            .unwrap();

        let seen = lock(&observer.seen);
        assert_eq!(seen.len(), 2);
        assert!(seen[0].started_loading());
        assert_eq!(seen[1].next, LoadingState::loading());
        assert_eq!(provider.state(), LoadingState::loading());
    }

    #[test]
    fn test_concurrent_commits_are_all_dispatched() {
        let provider = LoadingProvider::default();
        let context = provider.context();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let weak: Weak<dyn StateObserver> = Arc::downgrade(&recorder) as Weak<dyn StateObserver>;
        context.observe(ObserverId::new(), weak).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                let context = context.clone();
                s.spawn(move || {
                    for _ in 0..500 {
                        // every flip changes the state, so nothing is dropped as a no-op
                        context
                            .set_state(StateUpdate::update(|prev| LoadingState {
                                is_loading: !prev.is_loading,
                                ..prev
                            }))
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(lock(&recorder.seen).len(), 2000);
        assert!(lock(&provider.scope.dispatch).queue.is_empty());
        assert!(!lock(&provider.scope.dispatch).running);
    }

    #[test]
    fn test_dropped_observers_are_pruned() {
        let provider = LoadingProvider::default();
        let context = provider.context();
        {
            let recorder = Arc::new(Recorder {
                seen: Mutex::new(Vec::new()),
            });
            let weak: Weak<dyn StateObserver> = Arc::downgrade(&recorder) as Weak<dyn StateObserver>;
            context.observe(ObserverId::new(), weak).unwrap();
        }
        context.set_state(LoadingState::mounted()).unwrap();
        assert!(lock(&provider.scope.observers).is_empty());
    }

    #[test]
    fn test_context_fails_after_provider_dropped() {
        let provider = LoadingProvider::default();
        let context = provider.context();
        let id = provider.id();
        drop(provider);

        assert!(!context.is_alive());
        assert!(matches!(
            context.state(),
            Err(LoadingError::ProviderDropped(dropped)) if dropped == id
        ));
        assert!(context.set_state(LoadingState::mounted()).is_err());
    }

    #[tokio::test]
    async fn test_subscribe_sees_latest_state() {
        let provider = LoadingProvider::default();
        let context = provider.context();
        let mut rx = context.subscribe().unwrap();
        assert_eq!(*rx.borrow(), LoadingState::loading());

        context.set_state(LoadingState::mounted()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LoadingState::mounted());
    }
}
