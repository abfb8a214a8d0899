//! Host callback slots and the vocabulary shared by both plugin families.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::errors::{BridgeError, ErrorInfo};
use crate::strings::Encoding;

/// Longest path the host accepts in fixed buffers, terminator included.
pub const MAX_PATH: usize = 260;

/// Which host callback a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackRole {
    /// Transfer progress reporting with an abort answer.
    Progress,
    /// Yes/no or free-text questions to the user.
    Confirmation,
    /// Message log of the host.
    Logging,
    /// Password store of the host.
    Crypto,
    /// Next-volume prompts for multi-volume archives.
    VolumeChange,
}

impl fmt::Display for CallbackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallbackRole::Progress => "progress",
            CallbackRole::Confirmation => "confirmation",
            CallbackRole::Logging => "logging",
            CallbackRole::Crypto => "crypto",
            CallbackRole::VolumeChange => "volume-change",
        };
        f.write_str(name)
    }
}

/// A registered host function pointer tagged with its string encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostProc<N, W> {
    /// Pointer taking 8-bit strings.
    Narrow(N),
    /// Pointer taking UTF-16 strings.
    Wide(W),
}

impl<N, W> HostProc<N, W> {
    /// Encoding the pointer expects.
    pub fn encoding(&self) -> Encoding {
        match self {
            HostProc::Narrow(_) => Encoding::Narrow,
            HostProc::Wide(_) => Encoding::Wide,
        }
    }
}

/// Holds at most one active pointer for a role. Registering either encoding
/// replaces whatever was there, so both are never active together.
pub struct CallbackSlot<N, W> {
    role: CallbackRole,
    current: Mutex<Option<HostProc<N, W>>>,
}

impl<N: Copy, W: Copy> CallbackSlot<N, W> {
    /// Creates an empty slot for `role`.
    pub const fn new(role: CallbackRole) -> Self {
        Self {
            role,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<HostProc<N, W>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Role this slot serves.
    pub fn role(&self) -> CallbackRole {
        self.role
    }

    /// Stores `proc`, returning the pointer it replaced.
    pub fn register(&self, proc: HostProc<N, W>) -> Option<HostProc<N, W>> {
        self.lock().replace(proc)
    }

    /// Empties the slot.
    pub fn clear(&self) -> Option<HostProc<N, W>> {
        self.lock().take()
    }

    /// The active pointer, if any.
    pub fn active(&self) -> Option<HostProc<N, W>> {
        *self.lock()
    }

    /// Encoding of the active pointer, if any.
    pub fn encoding(&self) -> Option<Encoding> {
        self.active().map(|proc| proc.encoding())
    }

    /// The active pointer, or a callback error naming the empty role.
    pub fn require(&self) -> Result<HostProc<N, W>, BridgeError> {
        let role = self.role();
        self.active().ok_or_else(|| {
            BridgeError::Callback(
                ErrorInfo::new(
                    "tcb.callback.missing",
                    format!("no {role} callback registered"),
                )
                .with_context("role", role.to_string()),
            )
        })
    }
}

impl<N, W> fmt::Debug for CallbackSlot<N, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoding = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(HostProc::encoding);
        f.debug_struct("CallbackSlot")
            .field("role", &self.role)
            .field("active", &encoding)
            .finish()
    }
}

/// Answer of a progress-style callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    /// Keep going.
    Continue,
    /// The user asked to stop; the plugin should report its aborted status.
    Abort,
}

impl Flow {
    /// Whether the host asked to stop.
    pub fn is_abort(self) -> bool {
        self == Flow::Abort
    }
}

/// Password store request forwarded to the host crypto callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptRequest {
    /// Store `password` under `name`.
    Save {
        /// Key in the host store.
        name: String,
        /// Secret to store.
        password: String,
    },
    /// Load the password for `name`, asking for the master password if needed.
    Load {
        /// Key in the host store.
        name: String,
    },
    /// Load without prompting; fails while no master password was entered.
    LoadNoUi {
        /// Key in the host store.
        name: String,
    },
    /// Copy the entry `name` to `target`.
    Copy {
        /// Existing key.
        name: String,
        /// New key.
        target: String,
    },
    /// Rename the entry `name` to `target`.
    Move {
        /// Existing key.
        name: String,
        /// New key.
        target: String,
    },
    /// Delete the entry `name`.
    Delete {
        /// Key in the host store.
        name: String,
    },
}

impl CryptRequest {
    /// Wire mode number of the request.
    pub fn mode(&self) -> i32 {
        match self {
            CryptRequest::Save { .. } => 1,
            CryptRequest::Load { .. } => 2,
            CryptRequest::LoadNoUi { .. } => 3,
            CryptRequest::Copy { .. } => 4,
            CryptRequest::Move { .. } => 5,
            CryptRequest::Delete { .. } => 6,
        }
    }

    /// Key the request addresses.
    pub fn name(&self) -> &str {
        match self {
            CryptRequest::Save { name, .. }
            | CryptRequest::Load { name }
            | CryptRequest::LoadNoUi { name }
            | CryptRequest::Copy { name, .. }
            | CryptRequest::Move { name, .. }
            | CryptRequest::Delete { name } => name,
        }
    }

    /// Text placed in the in/out buffer before the call: the password for
    /// saves, the target key for copies and moves.
    pub fn payload(&self) -> Option<&str> {
        match self {
            CryptRequest::Save { password, .. } => Some(password),
            CryptRequest::Copy { target, .. } | CryptRequest::Move { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Whether the host writes a password back into the buffer.
    pub fn returns_password(&self) -> bool {
        matches!(
            self,
            CryptRequest::Load { .. } | CryptRequest::LoadNoUi { .. }
        )
    }
}

/// Bookkeeping delivered together with the crypto callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CryptOptions {
    /// Number the host expects back on every crypto call.
    pub crypto_number: i32,
    /// Raw flags word.
    pub flags: i32,
}

impl CryptOptions {
    /// Whether the user already entered the master password.
    pub fn master_password_set(&self) -> bool {
        self.flags & 1 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypt_modes_follow_wire_numbering() {
        let modes: Vec<i32> = [
            CryptRequest::Save {
                name: "a".into(),
                password: "p".into(),
            },
            CryptRequest::Load { name: "a".into() },
            CryptRequest::LoadNoUi { name: "a".into() },
            CryptRequest::Copy {
                name: "a".into(),
                target: "b".into(),
            },
            CryptRequest::Move {
                name: "a".into(),
                target: "b".into(),
            },
            CryptRequest::Delete { name: "a".into() },
        ]
        .iter()
        .map(CryptRequest::mode)
        .collect();
        assert_eq!(modes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_slot_requirement_names_its_role() {
        let slot: CallbackSlot<fn(), fn()> = CallbackSlot::new(CallbackRole::Logging);
        let err = slot.require().expect_err("empty slot");
        assert_eq!(err.code(), "tcb.callback.missing");
        assert_eq!(
            err.info().context.get("role").map(String::as_str),
            Some("logging")
        );
    }
}
