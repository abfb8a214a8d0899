//! Encoding-transparent access to the packer host callbacks.

use std::sync::{Mutex, PoisonError};

use tcb_core::callbacks::{
    CallbackRole, CallbackSlot, CryptOptions, CryptRequest, Flow, HostProc, MAX_PATH,
};
use tcb_core::errors::BridgeError;
use tcb_core::strings::{
    decode_str, encode_with_nul, write_fixed, Encoding, HostEncoding, Narrow, Wide,
};

use crate::abi::{
    ChangeVolProcA, ChangeVolProcW, PkCryptProcA, PkCryptProcW, ProcessDataProcA, ProcessDataProcW,
    PK_VOL_ASK, PK_VOL_NOTIFY,
};
use crate::status::PackerStatus;

pub type ChangeVolProc = HostProc<ChangeVolProcA, ChangeVolProcW>;
pub type ProcessDataProc = HostProc<ProcessDataProcA, ProcessDataProcW>;
pub type PkCryptProc = HostProc<PkCryptProcA, PkCryptProcW>;

/// What the change-volume callback is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeRequest {
    /// Ask the user for the next volume; the host may rewrite the name.
    Ask,
    /// Tell the host the next volume was found.
    Notify,
}

impl VolumeRequest {
    fn mode(self) -> i32 {
        match self {
            VolumeRequest::Ask => PK_VOL_ASK,
            VolumeRequest::Notify => PK_VOL_NOTIFY,
        }
    }
}

/// Progress reported to the process-data callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProgress {
    /// Bytes processed since the previous call.
    Bytes(u32),
    /// Percent of the current file, 0..=100.
    FilePercent(u8),
    /// Percent of the whole operation, 0..=100.
    TotalPercent(u8),
}

impl DataProgress {
    fn size(self) -> i32 {
        match self {
            DataProgress::Bytes(bytes) => i32::try_from(bytes).unwrap_or(i32::MAX),
            DataProgress::FilePercent(percent) => -i32::from(percent.clamp(1, 100)),
            DataProgress::TotalPercent(percent) => -1000 - i32::from(percent.min(100)),
        }
    }
}

/// Copies `text` into a host-sized buffer, lets `call` fill it, and reads the
/// result back.
fn round_trip<E: HostEncoding>(
    text: &str,
    call: impl FnOnce(*mut E::Unit, i32) -> i32,
) -> (i32, String) {
    let mut buffer = vec![E::Unit::default(); MAX_PATH];
    write_fixed::<E>(&mut buffer, Some(text));
    let answer = call(buffer.as_mut_ptr(), MAX_PATH as i32);
    (answer, decode_str::<E>(&buffer))
}

/// The three packer callbacks and the crypto bookkeeping that comes with them.
#[derive(Debug)]
pub struct PackerCallbacks {
    change_volume: CallbackSlot<ChangeVolProcA, ChangeVolProcW>,
    process_data: CallbackSlot<ProcessDataProcA, ProcessDataProcW>,
    crypt: CallbackSlot<PkCryptProcA, PkCryptProcW>,
    crypt_options: Mutex<Option<CryptOptions>>,
}

impl Default for PackerCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl PackerCallbacks {
    pub fn new() -> Self {
        Self {
            change_volume: CallbackSlot::new(CallbackRole::VolumeChange),
            process_data: CallbackSlot::new(CallbackRole::Progress),
            crypt: CallbackSlot::new(CallbackRole::Crypto),
            crypt_options: Mutex::new(None),
        }
    }

    pub fn register_change_volume(&self, proc: ChangeVolProc) {
        self.change_volume.register(proc);
    }

    pub fn register_process_data(&self, proc: ProcessDataProc) {
        self.process_data.register(proc);
    }

    /// Stores the crypto callback. The options of the first registration are
    /// kept; later registrations only replace the pointer.
    pub fn register_crypt(&self, proc: PkCryptProc, options: CryptOptions) {
        self.crypt.register(proc);
        self.crypt_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(options);
    }

    /// Encoding of the pointer active for `role`, if the packer family has one.
    pub fn active(&self, role: CallbackRole) -> Option<Encoding> {
        match role {
            CallbackRole::VolumeChange => self.change_volume.encoding(),
            CallbackRole::Progress => self.process_data.encoding(),
            CallbackRole::Crypto => self.crypt.encoding(),
            CallbackRole::Confirmation | CallbackRole::Logging => None,
        }
    }

    pub fn crypt_options(&self) -> Option<CryptOptions> {
        *self
            .crypt_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Asks for or announces the next volume. `Ok(None)` means the user
    /// aborted; `Ok(Some(name))` carries the possibly rewritten volume name.
    pub fn change_volume(
        &self,
        arc_name: &str,
        request: VolumeRequest,
    ) -> Result<Option<String>, BridgeError> {
        let proc = self.change_volume.require()?;
        let mode = request.mode();
        let (answer, name) = match proc {
            HostProc::Narrow(f) => round_trip::<Narrow>(arc_name, |buf, _| unsafe { f(buf, mode) }),
            HostProc::Wide(f) => round_trip::<Wide>(arc_name, |buf, _| unsafe { f(buf, mode) }),
        };
        Ok((answer != 0).then_some(name))
    }

    /// Reports progress. Without a registered callback the operation keeps
    /// going.
    pub fn process_data(&self, file_name: &str, progress: DataProgress) -> Flow {
        let Some(proc) = self.process_data.active() else {
            return Flow::Continue;
        };
        let size = progress.size();
        let answer = match proc {
            HostProc::Narrow(f) => {
                let mut name = encode_with_nul::<Narrow>(file_name);
                unsafe { f(name.as_mut_ptr(), size) }
            }
            HostProc::Wide(f) => {
                let mut name = encode_with_nul::<Wide>(file_name);
                unsafe { f(name.as_mut_ptr(), size) }
            }
        };
        if answer == 0 {
            Flow::Abort
        } else {
            Flow::Continue
        }
    }

    /// Forwards a password store request. Loads return the password; other
    /// requests return `None`. A non-zero host answer is passed through as
    /// the error status.
    pub fn crypt(&self, request: &CryptRequest) -> Result<Option<String>, PackerStatus> {
        let (Some(proc), Some(options)) = (self.crypt.active(), self.crypt_options()) else {
            return Err(PackerStatus::NotSupported);
        };
        let number = options.crypto_number;
        let mode = request.mode();
        let payload = request.payload().unwrap_or("");
        let (answer, secret) = match proc {
            HostProc::Narrow(f) => {
                let mut name = encode_with_nul::<Narrow>(request.name());
                round_trip::<Narrow>(payload, |buf, len| unsafe {
                    f(number, mode, name.as_mut_ptr(), buf, len)
                })
            }
            HostProc::Wide(f) => {
                let mut name = encode_with_nul::<Wide>(request.name());
                round_trip::<Wide>(payload, |buf, len| unsafe {
                    f(number, mode, name.as_mut_ptr(), buf, len)
                })
            }
        };
        if answer != 0 {
            return Err(PackerStatus::from_code(answer).unwrap_or(PackerStatus::ErrorRead));
        }
        Ok(request.returns_password().then_some(secret))
    }
}
