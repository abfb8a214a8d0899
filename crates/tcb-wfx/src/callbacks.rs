//! Encoding-transparent access to the file-system host callbacks.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

use tcb_core::callbacks::{
    CallbackRole, CallbackSlot, CryptOptions, CryptRequest, Flow, HostProc, MAX_PATH,
};
use tcb_core::errors::BridgeError;
use tcb_core::strings::{
    decode_str, encode_with_nul, write_fixed, Encoding, HostEncoding, Narrow, Wide,
};

use crate::abi::{
    FsCryptProcA, FsCryptProcW, LogProcA, LogProcW, ProgressProcA, ProgressProcW, RequestProcA,
    RequestProcW,
};
use crate::status::{FsStatus, LogKind, RequestKind};

pub type ProgressProc = HostProc<ProgressProcA, ProgressProcW>;
pub type LogProc = HostProc<LogProcA, LogProcW>;
pub type RequestProc = HostProc<RequestProcA, RequestProcW>;
pub type FsCryptProc = HostProc<FsCryptProcA, FsCryptProcW>;

/// Callbacks delivered by `FsInit` and `FsSetCryptCallback`, plus the plugin
/// number the host expects back on every call.
#[derive(Debug)]
pub struct FsCallbacks {
    plugin_nr: AtomicI32,
    progress: CallbackSlot<ProgressProcA, ProgressProcW>,
    log: CallbackSlot<LogProcA, LogProcW>,
    request: CallbackSlot<RequestProcA, RequestProcW>,
    crypt: CallbackSlot<FsCryptProcA, FsCryptProcW>,
    crypt_options: Mutex<Option<CryptOptions>>,
}

impl Default for FsCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer pre-filled with `text` that the host may overwrite.
fn buffer<E: HostEncoding>(text: Option<&str>) -> Vec<E::Unit> {
    let mut buffer = vec![E::Unit::default(); MAX_PATH];
    write_fixed::<E>(&mut buffer, text);
    buffer
}

fn text_arg<E: HostEncoding>(text: Option<&str>) -> Option<Vec<E::Unit>> {
    text.map(encode_with_nul::<E>)
}

fn text_ptr<U>(text: &mut Option<Vec<U>>) -> *mut U {
    match text {
        Some(units) => units.as_mut_ptr(),
        None => std::ptr::null_mut(),
    }
}

fn prompt<E: HostEncoding>(
    title: Option<&str>,
    text: Option<&str>,
    default: Option<&str>,
    call: impl FnOnce(*mut E::Unit, *mut E::Unit, *mut E::Unit, i32) -> i32,
) -> (bool, String) {
    let mut title = text_arg::<E>(title);
    let mut text = text_arg::<E>(text);
    let mut answer = buffer::<E>(default);
    let confirmed = call(
        text_ptr(&mut title),
        text_ptr(&mut text),
        answer.as_mut_ptr(),
        MAX_PATH as i32,
    );
    (confirmed != 0, decode_str::<E>(&answer))
}

impl FsCallbacks {
    pub fn new() -> Self {
        Self {
            plugin_nr: AtomicI32::new(0),
            progress: CallbackSlot::new(CallbackRole::Progress),
            log: CallbackSlot::new(CallbackRole::Logging),
            request: CallbackSlot::new(CallbackRole::Confirmation),
            crypt: CallbackSlot::new(CallbackRole::Crypto),
            crypt_options: Mutex::new(None),
        }
    }

    /// Stores what `FsInit` delivers. Null pointers leave their slot empty.
    pub fn init(
        &self,
        plugin_nr: i32,
        progress: Option<ProgressProc>,
        log: Option<LogProc>,
        request: Option<RequestProc>,
    ) {
        self.plugin_nr.store(plugin_nr, Ordering::SeqCst);
        match progress {
            Some(proc) => self.progress.register(proc),
            None => self.progress.clear(),
        };
        match log {
            Some(proc) => self.log.register(proc),
            None => self.log.clear(),
        };
        match request {
            Some(proc) => self.request.register(proc),
            None => self.request.clear(),
        };
    }

    /// Stores the crypto callback. The options of the first registration are
    /// kept; later registrations only replace the pointer.
    pub fn register_crypt(&self, proc: FsCryptProc, options: CryptOptions) {
        self.crypt.register(proc);
        self.crypt_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(options);
    }

    pub fn plugin_nr(&self) -> i32 {
        self.plugin_nr.load(Ordering::SeqCst)
    }

    pub fn active(&self, role: CallbackRole) -> Option<Encoding> {
        match role {
            CallbackRole::Progress => self.progress.encoding(),
            CallbackRole::Logging => self.log.encoding(),
            CallbackRole::Confirmation => self.request.encoding(),
            CallbackRole::Crypto => self.crypt.encoding(),
            CallbackRole::VolumeChange => None,
        }
    }

    pub fn crypt_options(&self) -> Option<CryptOptions> {
        *self
            .crypt_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports transfer progress. `percent` is clamped to 0..=100. A non-zero
    /// host answer asks the plugin to abort.
    pub fn progress(&self, source: &str, target: &str, percent: i32) -> Flow {
        let Some(proc) = self.progress.active() else {
            return Flow::Continue;
        };
        let nr = self.plugin_nr();
        let percent = percent.clamp(0, 100);
        let answer = match proc {
            HostProc::Narrow(f) => {
                let mut source = encode_with_nul::<Narrow>(source);
                let mut target = encode_with_nul::<Narrow>(target);
                unsafe { f(nr, source.as_mut_ptr(), target.as_mut_ptr(), percent) }
            }
            HostProc::Wide(f) => {
                let mut source = encode_with_nul::<Wide>(source);
                let mut target = encode_with_nul::<Wide>(target);
                unsafe { f(nr, source.as_mut_ptr(), target.as_mut_ptr(), percent) }
            }
        };
        if answer != 0 {
            Flow::Abort
        } else {
            Flow::Continue
        }
    }

    /// Writes a line to the host log window. Dropped when no log callback is
    /// registered.
    pub fn log(&self, kind: LogKind, message: &str) {
        let Some(proc) = self.log.active() else {
            return;
        };
        let nr = self.plugin_nr();
        match proc {
            HostProc::Narrow(f) => {
                let mut message = encode_with_nul::<Narrow>(message);
                unsafe { f(nr, kind.code(), message.as_mut_ptr()) }
            }
            HostProc::Wide(f) => {
                let mut message = encode_with_nul::<Wide>(message);
                unsafe { f(nr, kind.code(), message.as_mut_ptr()) }
            }
        }
    }

    /// Shows a host prompt. `Ok(None)` means the user cancelled; otherwise the
    /// entered text (empty for message boxes).
    pub fn request(
        &self,
        kind: RequestKind,
        title: Option<&str>,
        text: Option<&str>,
        default: Option<&str>,
    ) -> Result<Option<String>, BridgeError> {
        let proc = self.request.require()?;
        let nr = self.plugin_nr();
        let (confirmed, answer) = match proc {
            HostProc::Narrow(f) => {
                prompt::<Narrow>(title, text, default, |title, text, answer, len| unsafe {
                    f(nr, kind.code(), title, text, answer, len)
                })
            }
            HostProc::Wide(f) => {
                prompt::<Wide>(title, text, default, |title, text, answer, len| unsafe {
                    f(nr, kind.code(), title, text, answer, len)
                })
            }
        };
        if !confirmed {
            return Ok(None);
        }
        if !kind.returns_text() {
            return Ok(Some(String::new()));
        }
        Ok(Some(answer))
    }

    /// Forwards a password store request for a connection. Loads return the
    /// password; a non-zero host answer is passed through as the error status.
    pub fn crypt(&self, request: &CryptRequest) -> Result<Option<String>, FsStatus> {
        let (Some(proc), Some(options)) = (self.crypt.active(), self.crypt_options()) else {
            return Err(FsStatus::NotSupported);
        };
        let nr = self.plugin_nr();
        let number = options.crypto_number;
        let mode = request.mode();
        let payload = request.payload();
        let (answer, secret) = match proc {
            HostProc::Narrow(f) => {
                let mut name = encode_with_nul::<Narrow>(request.name());
                let mut secret = buffer::<Narrow>(payload);
                let (name_ptr, secret_ptr) = (name.as_mut_ptr(), secret.as_mut_ptr());
                let answer = unsafe { f(nr, number, mode, name_ptr, secret_ptr, MAX_PATH as i32) };
                (answer, decode_str::<Narrow>(&secret))
            }
            HostProc::Wide(f) => {
                let mut name = encode_with_nul::<Wide>(request.name());
                let mut secret = buffer::<Wide>(payload);
                let (name_ptr, secret_ptr) = (name.as_mut_ptr(), secret.as_mut_ptr());
                let answer = unsafe { f(nr, number, mode, name_ptr, secret_ptr, MAX_PATH as i32) };
                (answer, decode_str::<Wide>(&secret))
            }
        };
        if answer != 0 {
            return Err(FsStatus::from_code(answer).unwrap_or(FsStatus::ReadError));
        }
        Ok(request.returns_password().then_some(secret))
    }
}
