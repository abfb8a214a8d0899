//! Process-wide plugin instance with an explicit two-phase lifecycle.
//!
//! The exported functions share one static [`PluginInstance`]. The first call
//! to reach it starts the runtime; concurrent first calls wait for that start
//! instead of racing it. The unload hook calls [`PluginInstance::teardown`],
//! after which every export answers with its failure value.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::trace::{panic_fault, LOG_TARGET};

/// State owned by a started plugin: handle tables, callbacks and the plugin.
pub trait BridgeRuntime: Send + Sync + Sized + 'static {
    /// Builds the runtime from the loaded configuration.
    fn start(config: BridgeConfig) -> Result<Self, BridgeError>;

    /// Releases every live session. Called once, from teardown.
    fn shutdown(&self);
}

enum State<R> {
    Idle,
    Live(Arc<R>),
    Failed,
    TornDown,
}

/// Lazily started runtime behind the exported symbols.
pub struct PluginInstance<R> {
    state: RwLock<State<R>>,
}

impl<R: BridgeRuntime> Default for PluginInstance<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BridgeRuntime> PluginInstance<R> {
    /// Creates an instance that has not started yet.
    pub const fn new() -> Self {
        Self {
            state: RwLock::new(State::Idle),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the runtime, starting it on first use. `None` once start failed
    /// or after teardown.
    pub fn runtime(&self) -> Option<Arc<R>> {
        if let Some(found) = self.settled() {
            return found;
        }
        self.start_with(|| R::start(load_config()))
    }

    /// Starts the runtime with `build` unless some start already happened.
    /// Returns the live runtime, if any.
    pub fn start_with(&self, build: impl FnOnce() -> Result<R, BridgeError>) -> Option<Arc<R>> {
        let mut state = self.write();
        if matches!(*state, State::Idle) {
            *state = match catch_unwind(AssertUnwindSafe(build)) {
                Ok(Ok(runtime)) => {
                    log::debug!(target: LOG_TARGET, "plugin runtime started");
                    State::Live(Arc::new(runtime))
                }
                Ok(Err(err)) => {
                    log::error!(target: LOG_TARGET, "plugin runtime failed to start: {err}");
                    State::Failed
                }
                Err(payload) => {
                    let err = panic_fault("start", payload.as_ref());
                    log::error!(target: LOG_TARGET, "plugin runtime failed to start: {err}");
                    State::Failed
                }
            };
        }
        match &*state {
            State::Live(runtime) => Some(Arc::clone(runtime)),
            _ => None,
        }
    }

    fn settled(&self) -> Option<Option<Arc<R>>> {
        match &*self.read() {
            State::Idle => None,
            State::Live(runtime) => Some(Some(Arc::clone(runtime))),
            State::Failed | State::TornDown => Some(None),
        }
    }

    /// Runs `op` against the runtime, or returns `failure` when there is none.
    pub fn enter<T>(&self, failure: T, op: impl FnOnce(&R) -> T) -> T {
        match self.runtime() {
            Some(runtime) => op(&runtime),
            None => failure,
        }
    }

    /// Shuts the runtime down and refuses every later call.
    pub fn teardown(&self) {
        let previous = std::mem::replace(&mut *self.write(), State::TornDown);
        if let State::Live(runtime) = previous {
            if catch_unwind(AssertUnwindSafe(|| runtime.shutdown())).is_err() {
                log::error!(target: LOG_TARGET, "plugin runtime panicked during shutdown");
            }
        }
    }

    /// Whether a runtime is currently started.
    pub fn is_live(&self) -> bool {
        matches!(*self.read(), State::Live(_))
    }
}

fn load_config() -> BridgeConfig {
    BridgeConfig::from_env().unwrap_or_else(|err| {
        log::warn!(target: LOG_TARGET, "using default configuration: {err}");
        BridgeConfig::default()
    })
}
