//! # Event Wizard Runtime
//!
//! Runtime implementation for the event wizard.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer, executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to the reducer
//! - **Effect Handle**: Lets callers wait until an action's whole effect chain settles
//!
//! ## Example
//!
//! ```ignore
//! use event_wizard_runtime::Store;
//!
//! let store = Store::new(WizardState::default(), WizardReducer::new(), environment);
//!
//! let mut handle = store.send(WizardAction::SubmitEventStep).await?;
//! handle.wait().await;
//!
//! let step = store.state(|s| s.step).await;
//! ```

use event_wizard_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and rejects new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out with effects still running
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects or a terminal action
        #[error("Timeout waiting for store")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Actions produced by effects are fed back
/// under the same handle, so waiting covers the full chain: a submit, its
/// remote call, the outcome action, and any notification the outcome emits.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running under this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so nothing can still be running.
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: tracking context carried through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Runs even if the effect future panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements the store-wide pending counter on drop
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the reducer runs under the write lock)
    /// 2. Reducer (wizard logic)
    /// 3. Environment (injected capabilities)
    /// 4. Effect execution (with feedback loop)
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is
        /// fed back into the reducer.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast keeps 16 actions for slow observers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a store with a custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Access the injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Starts the returned effects on spawned tasks
        ///
        /// Returns after the effects have started, not after they finish.
        /// Use the returned [`EffectHandle`] to wait for the whole chain.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let (handle, tracking) = EffectHandle::new();
            self.send_internal(action, tracking).await?;
            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes before sending so the terminal action cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action within `timeout`
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Reject new actions and wait for running effects to drain
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        async fn send_internal(&self, action: A, tracking: EffectTracking) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!(?action, "Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&mut *state, action, &self.environment)
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(())
        }

        /// Feed an effect-produced action back into the store
        async fn feed_back(&self, action: A, tracking: EffectTracking) {
            let _ = self.action_broadcast.send(action.clone());
            if let Err(error) = self.send_internal(action, tracking).await {
                tracing::warn!(%error, "Dropped action produced by effect");
            }
        }

        /// Execute an effect under `tracking`
        ///
        /// - `None`: No-op
        /// - `Future`: awaits the computation and feeds back its action
        /// - `Delay`: sleeps, then feeds back the action
        /// - `Parallel`: executes each child under the same tracking
        /// - `Sequential`: executes children in order, each fully settled
        ///   (including its feedback chain) before the next starts
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let (store, guard, pending) = self.begin(&tracking);

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending = pending;

                        if let Some(action) = fut.await {
                            store.feed_back(action, tracking).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let (store, guard, pending) = self.begin(&tracking);

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending = pending;

                        tokio::time::sleep(duration).await;
                        store.feed_back(*action, tracking).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    let (store, guard, pending) = self.begin(&tracking);

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending = pending;

                        for effect in effects {
                            let (mut sub_handle, sub_tracking) = EffectHandle::new();
                            store.execute_effect(effect, sub_tracking);
                            sub_handle.wait().await;
                        }
                    });
                },
            }
        }

        /// Register one running effect and hand back what its task needs
        fn begin(&self, tracking: &EffectTracking) -> (Self, DecrementGuard, AtomicCounterGuard) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            (
                self.clone(),
                DecrementGuard(tracking.clone()),
                AtomicCounterGuard(Arc::clone(&self.pending_effects)),
            )
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use event_wizard_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

    #[derive(Debug, Clone, Default)]
    struct UploadState {
        uploaded: Vec<String>,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone)]
    enum UploadAction {
        Upload(String),
        Uploaded(String),
        UploadBoth,
        UploadLater(String),
        StepA,
        StepB,
        Mark(&'static str),
    }

    #[derive(Debug, Clone)]
    struct UploadEnv;

    #[derive(Debug, Clone)]
    struct UploadReducer;

    impl Reducer for UploadReducer {
        type State = UploadState;
        type Action = UploadAction;
        type Environment = UploadEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                UploadAction::Upload(name) => {
                    smallvec![Effect::Future(Box::pin(async move {
                        Some(UploadAction::Uploaded(name))
                    }))]
                },
                UploadAction::Uploaded(name) => {
                    state.uploaded.push(name);
                    SmallVec::new()
                },
                UploadAction::UploadBoth => smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async {
                        Some(UploadAction::Upload("a.png".to_string()))
                    })),
                    Effect::Future(Box::pin(async {
                        Some(UploadAction::Upload("b.png".to_string()))
                    })),
                ])],
                UploadAction::UploadLater(name) => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(UploadAction::Upload(name)),
                }],
                UploadAction::StepA => smallvec![Effect::Sequential(vec![
                    Effect::Future(Box::pin(async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(UploadAction::Mark("first"))
                    })),
                    Effect::Future(Box::pin(async { Some(UploadAction::Mark("second")) })),
                ])],
                UploadAction::StepB => smallvec![Effect::None],
                UploadAction::Mark(label) => {
                    state.log.push(label);
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<UploadState, UploadAction, UploadEnv, UploadReducer> {
        Store::new(UploadState::default(), UploadReducer, UploadEnv)
    }

    #[tokio::test]
    async fn wait_covers_feedback_chain() {
        let store = store();
        let mut handle = store
            .send(UploadAction::Upload("banner.png".to_string()))
            .await
            .unwrap();
        handle.wait().await;

        let uploaded = store.state(|s| s.uploaded.clone()).await;
        assert_eq!(uploaded, vec!["banner.png".to_string()]);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn parallel_effects_cascade() {
        let store = store();
        let mut handle = store.send(UploadAction::UploadBoth).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        let mut uploaded = store.state(|s| s.uploaded.clone()).await;
        uploaded.sort();
        assert_eq!(uploaded, vec!["a.png".to_string(), "b.png".to_string()]);
    }

    #[tokio::test]
    async fn delay_feeds_action_back() {
        let store = store();
        let mut handle = store
            .send(UploadAction::UploadLater("late.png".to_string()))
            .await
            .unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.uploaded.len()).await, 1);
    }

    #[tokio::test]
    async fn sequential_effects_keep_order() {
        let store = store();
        let mut handle = store.send(UploadAction::StepA).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.log.clone()).await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn none_effect_completes_immediately() {
        let store = store();
        let mut handle = store.send(UploadAction::StepB).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = store();
        let result = store
            .send_and_wait_for(
                UploadAction::Upload("x.png".to_string()),
                |a| matches!(a, UploadAction::Uploaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert!(matches!(result, UploadAction::Uploaded(name) if name == "x.png"));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(UploadAction::StepB).await;
        assert_eq!(result.unwrap_err(), StoreError::ShutdownInProgress);
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        handle
            .wait_with_timeout(Duration::from_millis(10))
            .await
            .unwrap();
    }
}
