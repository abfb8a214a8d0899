//! Opaque handles for plugin-side session objects.
//!
//! The host stores a pointer-sized integer and hands it back unchanged. The
//! integer is a key into a guarded map, never a cast pointer, so a stale or
//! tampered value just misses the lookup.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{BridgeError, ErrorInfo};

/// Non-zero token naming a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroUsize);

impl Handle {
    /// Interprets a raw host value. Zero is never a handle.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// Interprets a host `HANDLE`-typed value.
    pub fn from_isize(raw: isize) -> Option<Self> {
        Self::from_raw(raw as usize)
    }

    /// Returns the raw value handed to the host.
    pub fn as_raw(self) -> usize {
        self.0.get()
    }

    /// Returns the raw value in `HANDLE` form.
    pub fn as_isize(self) -> isize {
        self.0.get() as isize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The all-ones value doubles as `INVALID_HANDLE_VALUE` for some exports, so
/// it is never issued.
const RESERVED_ALL_ONES: usize = usize::MAX;

struct Entry<T> {
    object: T,
    usage: u64,
}

struct TableState<T> {
    next: usize,
    live: HashMap<usize, Entry<T>>,
}

/// Thread-safe map from handle to session object.
///
/// Handles come from a monotonic counter. After wrap-around the counter skips
/// zero, the all-ones value and every handle still live, so a value is never
/// issued twice while it is live.
pub struct HandleTable<T> {
    state: Mutex<TableState<T>>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState {
                next: 1,
                live: HashMap::new(),
            }),
        }
    }

    // No plugin code runs while the lock is held, so a poisoned lock still
    // guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, TableState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `object` under a freshly minted handle.
    pub fn add(&self, object: T) -> Handle {
        let mut state = self.lock();
        let raw = loop {
            let candidate = state.next;
            state.next = state.next.wrapping_add(1);
            if candidate != 0
                && candidate != RESERVED_ALL_ONES
                && !state.live.contains_key(&candidate)
            {
                break candidate;
            }
        };
        state.live.insert(raw, Entry { object, usage: 0 });
        match Handle::from_raw(raw) {
            Some(handle) => handle,
            None => unreachable!("zero is skipped when minting"),
        }
    }

    /// Replaces the object under a live handle. Returns `false` and changes
    /// nothing when the handle is not live.
    pub fn update(&self, handle: Handle, object: T) -> bool {
        let mut state = self.lock();
        match state.live.get_mut(&handle.as_raw()) {
            Some(entry) => {
                entry.object = object;
                entry.usage += 1;
                true
            }
            None => false,
        }
    }

    /// Detaches the handle and returns its usage count. `None` when the handle
    /// was not live, so only one caller ever observes the release.
    pub fn remove(&self, handle: Handle) -> Option<u64> {
        self.take(handle).map(|(_, usage)| usage)
    }

    /// Detaches the handle and returns the object together with its usage
    /// count.
    pub fn take(&self, handle: Handle) -> Option<(T, u64)> {
        let mut state = self.lock();
        state
            .live
            .remove(&handle.as_raw())
            .map(|entry| (entry.object, entry.usage + 1))
    }

    /// Whether the handle is live.
    pub fn contains(&self, handle: Handle) -> bool {
        self.lock().live.contains_key(&handle.as_raw())
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.lock().live.len()
    }

    /// Whether no handle is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detaches every handle, returning the objects so the caller can drop
    /// them outside the lock.
    pub fn drain(&self) -> Vec<T> {
        let mut state = self.lock();
        state.live.drain().map(|(_, entry)| entry.object).collect()
    }
}

impl<T: Clone> HandleTable<T> {
    /// Returns a clone of the object under a live handle and counts the use.
    pub fn get(&self, handle: Handle) -> Option<T> {
        let mut state = self.lock();
        state.live.get_mut(&handle.as_raw()).map(|entry| {
            entry.usage += 1;
            entry.object.clone()
        })
    }
}

#[cfg(test)]
impl<T> HandleTable<T> {
    fn seed_counter(&self, next: usize) {
        self.lock().next = next;
    }
}

/// Session object shared between the table and an in-flight call.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wraps a session object for storage in a [`HandleTable`].
pub fn shared<T>(object: T) -> Shared<T> {
    Arc::new(Mutex::new(object))
}

/// Locks a session for a plugin call. A session whose previous call panicked
/// is reported as unusable instead of being handed out again.
pub fn lock_session<T>(session: &Shared<T>) -> Result<MutexGuard<'_, T>, BridgeError> {
    session.lock().map_err(|_| {
        BridgeError::Handle(
            ErrorInfo::new(
                "tcb.handle.poisoned",
                "session was left inconsistent by an earlier fault",
            )
            .with_hint("close the session and open a new one"),
        )
    })
}

/// Locks a session that is being closed; poisoning is ignored because the
/// object is about to be dropped.
pub fn lock_for_release<T>(session: &Shared<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}
