//! One adapter per file-system export.
//!
//! Same shape as the packer adapters: decode, resolve the listing handle, run
//! the plugin inside the funnel, encode. Out-parameters are only written on
//! success.

use std::path::PathBuf;

use tcb_core::callbacks::{CryptOptions, MAX_PATH};
use tcb_core::config::{DefaultParamStruct, DefaultParams};
use tcb_core::errors::BridgeError;
use tcb_core::handles::{lock_for_release, lock_session, shared};
use tcb_core::strings::{read_str, write_fixed_raw, HostEncoding, Narrow};
use tcb_core::time::{decode_file_time, join_u64};
use tcb_core::trace::{Outcome, TraceLevel};

use crate::abi::{
    RemoteInfoStruct, Win32FindData, ERROR_NO_MORE_FILES, ERROR_PATH_NOT_FOUND,
    INVALID_HANDLE_VALUE,
};
use crate::callbacks::{FsCryptProc, LogProc, ProgressProc, RequestProc};
use crate::find::write_find_data;
use crate::outcome::{ExecOutcome, FileTransfer, IconOutcome};
use crate::plugin::{
    ExecRequest, ExecVerb, FindFirst, FsPlugin, GetFileRequest, ParentWindow, PutFileRequest,
    RemoteFileInfo, RenMovRequest,
};
use crate::runtime::FsRuntime;
use crate::status::{
    fs_background_flags, CopyFlags, FsStatus, IconFlags, StatusOperation, StatusPhase,
};

/// Answer of `FsFindFirst`: the handle plus the last-error code the export
/// has to set when the handle is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindFirstAnswer {
    pub handle: isize,
    pub last_error: Option<u32>,
}

impl FindFirstAnswer {
    pub const fn invalid(last_error: Option<u32>) -> Self {
        Self {
            handle: INVALID_HANDLE_VALUE,
            last_error,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.handle != INVALID_HANDLE_VALUE
    }
}

unsafe fn required<E: HostEncoding>(
    operation: &str,
    argument: &str,
    ptr: *const E::Unit,
) -> Result<String, BridgeError> {
    read_str::<E>(ptr).ok_or_else(|| BridgeError::missing_argument(operation, argument))
}

unsafe fn remote_info(info: *const RemoteInfoStruct) -> Option<RemoteFileInfo> {
    let info = info.as_ref()?;
    Some(RemoteFileInfo {
        size: join_u64(info.size_high, info.size_low),
        modified: decode_file_time(info.last_write_time),
        attributes: info.attr as u32,
    })
}

fn transfer_detail(transfer: &FileTransfer) -> String {
    match &transfer.renamed {
        Some(name) => format!("{} -> {name}", transfer.status),
        None => transfer.status.to_string(),
    }
}

/// `FsInit`/`FsInitW`. Returns 0, or -1 when the plugin refuses.
pub fn fs_init<P: FsPlugin>(
    rt: &FsRuntime<P>,
    name: &'static str,
    plugin_nr: i32,
    progress: Option<ProgressProc>,
    log: Option<LogProc>,
    request: Option<RequestProc>,
) -> i32 {
    rt.funnel().run(name, TraceLevel::Warning, -1, |site| {
        site.arg(plugin_nr);
        let detail = match progress {
            Some(proc) => proc.encoding().to_string(),
            None => "no progress callback".to_string(),
        };
        rt.callbacks().init(plugin_nr, progress, log, request);
        rt.plugin().init()?;
        Ok(Outcome::with_detail(0, detail))
    })
}

/// `FsFindFirst`/`FsFindFirstW`.
///
/// # Safety
///
/// A non-null `path` must be terminated; a non-null `data` must point to a
/// writable find-data block.
pub unsafe fn find_first<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    path: *const E::Unit,
    data: *mut Win32FindData<E::Unit>,
) -> FindFirstAnswer {
    rt.funnel().run(
        "FsFindFirst",
        TraceLevel::Info,
        FindFirstAnswer::invalid(None),
        |site| {
            let path = required::<E>("FsFindFirst", "path", path)?;
            site.arg(&path);
            let data = data
                .as_mut()
                .ok_or_else(|| BridgeError::missing_argument("FsFindFirst", "find data"))?;
            match rt.plugin().find_first(&path)? {
                FindFirst::Found(entry, listing) => {
                    write_find_data::<E>(data, &entry);
                    let handle = rt.admit(shared(listing))?;
                    Ok(Outcome::with_detail(
                        FindFirstAnswer {
                            handle: handle.as_isize(),
                            last_error: None,
                        },
                        format!("{handle} ({})", entry.name),
                    ))
                }
                FindFirst::Empty => Ok(Outcome::with_detail(
                    FindFirstAnswer::invalid(Some(ERROR_NO_MORE_FILES)),
                    "empty",
                )),
                FindFirst::NotFound => Ok(Outcome::with_detail(
                    FindFirstAnswer::invalid(Some(ERROR_PATH_NOT_FOUND)),
                    "not found",
                )),
            }
        },
    )
}

/// `FsFindNext`/`FsFindNextW`. Returns a Win32 `BOOL`.
///
/// # Safety
///
/// A non-null `data` must point to a writable find-data block.
pub unsafe fn find_next<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    raw: isize,
    data: *mut Win32FindData<E::Unit>,
) -> i32 {
    rt.funnel()
        .run("FsFindNext", TraceLevel::Verbose, 0, |site| {
            site.arg(raw);
            let Some((handle, listing)) = rt.listing(raw) else {
                return Ok(Outcome::with_detail(0, "unknown handle"));
            };
            let data = data
                .as_mut()
                .ok_or_else(|| BridgeError::missing_argument("FsFindNext", "find data"))?;
            let next = rt.plugin().find_next(&mut *lock_session(&listing)?)?;
            match next {
                Some(entry) => {
                    write_find_data::<E>(data, &entry);
                    rt.listings().update(handle, listing);
                    Ok(Outcome::with_detail(1, entry.name))
                }
                None => Ok(Outcome::with_detail(0, "end")),
            }
        })
}

/// `FsFindClose`. The handle is released even when the plugin faults.
pub fn find_close<P: FsPlugin>(rt: &FsRuntime<P>, raw: isize) -> i32 {
    rt.funnel().run("FsFindClose", TraceLevel::Info, 0, |site| {
        site.arg(raw);
        let Some((handle, _)) = rt.listing(raw) else {
            return Ok(Outcome::with_detail(0, "unknown handle"));
        };
        let Some((listing, usage)) = rt.listings().take(handle) else {
            return Ok(Outcome::with_detail(0, "unknown handle"));
        };
        rt.plugin().find_close(&mut lock_for_release(&listing))?;
        Ok(Outcome::with_detail(0, format!("{usage} calls")))
    })
}

/// `FsGetFile`/`FsGetFileW`. A renamed target is written back into
/// `local_name`.
///
/// # Safety
///
/// Non-null names must be terminated and `local_name` must hold `MAX_PATH`
/// units; a non-null `info` must be readable.
pub unsafe fn get_file<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_name: *const E::Unit,
    local_name: *mut E::Unit,
    copy_flags: i32,
    info: *const RemoteInfoStruct,
) -> i32 {
    rt.funnel().run(
        "FsGetFile",
        TraceLevel::Info,
        FsStatus::ReadError.code(),
        |site| {
            let remote_name = required::<E>("FsGetFile", "remote name", remote_name)?;
            let local = required::<E>("FsGetFile", "local name", local_name)?;
            let flags = CopyFlags(copy_flags);
            site.arg(&remote_name).arg(&local).arg(flags);
            let transfer = rt.plugin().get_file(GetFileRequest {
                remote_name,
                local_name: PathBuf::from(local),
                flags,
                info: remote_info(info),
            })?;
            if transfer.status.is_ok() {
                if let Some(renamed) = &transfer.renamed {
                    write_fixed_raw::<E>(local_name, MAX_PATH, Some(renamed));
                }
            }
            Ok(Outcome::with_detail(transfer.status.code(), transfer_detail(&transfer)))
        },
    )
}

/// `FsPutFile`/`FsPutFileW`. A renamed target is written back into
/// `remote_name`.
///
/// # Safety
///
/// Non-null names must be terminated and `remote_name` must hold `MAX_PATH`
/// units.
pub unsafe fn put_file<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    local_name: *const E::Unit,
    remote_name: *mut E::Unit,
    copy_flags: i32,
) -> i32 {
    rt.funnel().run(
        "FsPutFile",
        TraceLevel::Info,
        FsStatus::WriteError.code(),
        |site| {
            let local = required::<E>("FsPutFile", "local name", local_name)?;
            let remote = required::<E>("FsPutFile", "remote name", remote_name)?;
            let flags = CopyFlags(copy_flags);
            site.arg(&local).arg(&remote).arg(flags);
            let transfer = rt.plugin().put_file(PutFileRequest {
                local_name: PathBuf::from(local),
                remote_name: remote,
                flags,
            })?;
            if transfer.status.is_ok() {
                if let Some(renamed) = &transfer.renamed {
                    write_fixed_raw::<E>(remote_name, MAX_PATH, Some(renamed));
                }
            }
            Ok(Outcome::with_detail(transfer.status.code(), transfer_detail(&transfer)))
        },
    )
}

/// `FsRenMovFile`/`FsRenMovFileW`.
///
/// # Safety
///
/// Non-null names must be terminated; a non-null `info` must be readable.
pub unsafe fn ren_mov_file<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    old_name: *const E::Unit,
    new_name: *const E::Unit,
    move_file: i32,
    overwrite: i32,
    info: *const RemoteInfoStruct,
) -> i32 {
    rt.funnel().run(
        "FsRenMovFile",
        TraceLevel::Info,
        FsStatus::WriteError.code(),
        |site| {
            let old_name = required::<E>("FsRenMovFile", "old name", old_name)?;
            let new_name = required::<E>("FsRenMovFile", "new name", new_name)?;
            let (move_file, overwrite) = (move_file != 0, overwrite != 0);
            site.arg(&old_name).arg(&new_name);
            if move_file {
                site.arg("move");
            }
            if overwrite {
                site.arg("overwrite");
            }
            let status = rt.plugin().rename_move(RenMovRequest {
                old_name,
                new_name,
                move_file,
                overwrite,
                info: remote_info(info),
            })?;
            Ok(Outcome::with_detail(status.code(), status.to_string()))
        },
    )
}

fn yes_no(done: bool) -> Outcome<i32> {
    Outcome::with_detail(i32::from(done), if done { "Yes" } else { "No" })
}

/// `FsDeleteFile`/`FsDeleteFileW`. Returns a Win32 `BOOL`.
///
/// # Safety
///
/// A non-null `remote_name` must be terminated.
pub unsafe fn delete_file<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_name: *const E::Unit,
) -> i32 {
    rt.funnel()
        .run("FsDeleteFile", TraceLevel::Info, 0, |site| {
            let remote_name = required::<E>("FsDeleteFile", "remote name", remote_name)?;
            site.arg(&remote_name);
            Ok(yes_no(rt.plugin().delete_file(&remote_name)?))
        })
}

/// `FsMkDir`/`FsMkDirW`. Returns a Win32 `BOOL`.
///
/// # Safety
///
/// A non-null `path` must be terminated.
pub unsafe fn mk_dir<P: FsPlugin, E: HostEncoding>(rt: &FsRuntime<P>, path: *const E::Unit) -> i32 {
    rt.funnel().run("FsMkDir", TraceLevel::Info, 0, |site| {
        let path = required::<E>("FsMkDir", "path", path)?;
        site.arg(&path);
        Ok(yes_no(rt.plugin().make_dir(&path)?))
    })
}

/// `FsRemoveDir`/`FsRemoveDirW`. Returns a Win32 `BOOL`.
///
/// # Safety
///
/// A non-null `remote_name` must be terminated.
pub unsafe fn remove_dir<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_name: *const E::Unit,
) -> i32 {
    rt.funnel().run("FsRemoveDir", TraceLevel::Info, 0, |site| {
        let remote_name = required::<E>("FsRemoveDir", "remote name", remote_name)?;
        site.arg(&remote_name);
        Ok(yes_no(rt.plugin().remove_dir(&remote_name)?))
    })
}

/// `FsExecuteFile`/`FsExecuteFileW`. A symlink target is written back into
/// `remote_name`.
///
/// # Safety
///
/// Non-null strings must be terminated and `remote_name` must hold
/// `MAX_PATH` units.
pub unsafe fn execute_file<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    parent: isize,
    remote_name: *mut E::Unit,
    verb: *const E::Unit,
) -> i32 {
    rt.funnel().run(
        "FsExecuteFile",
        TraceLevel::Info,
        ExecOutcome::Error.code(),
        |site| {
            let remote = required::<E>("FsExecuteFile", "remote name", remote_name)?;
            let verb = ExecVerb::parse(&required::<E>("FsExecuteFile", "verb", verb)?);
            site.arg(&remote).arg(&verb);
            let outcome = rt.plugin().execute(ExecRequest {
                parent: ParentWindow(parent),
                remote_name: remote,
                verb,
            })?;
            let detail = match &outcome {
                ExecOutcome::Symlink(target) => {
                    write_fixed_raw::<E>(remote_name, MAX_PATH, Some(target));
                    format!("Symlink -> {target}")
                }
                other => format!("{other:?}"),
            };
            Ok(Outcome::with_detail(outcome.code(), detail))
        },
    )
}

/// `FsExtractCustomIcon`/`FsExtractCustomIconW`.
///
/// A delayed answer to a call that already runs in the background becomes
/// "use default".
///
/// # Safety
///
/// `remote_name` must be terminated and hold `MAX_PATH` units; a non-null
/// `the_icon` must be writable.
pub unsafe fn extract_custom_icon<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_name: *mut E::Unit,
    extract_flags: i32,
    the_icon: *mut isize,
) -> i32 {
    rt.funnel()
        .run("FsExtractCustomIcon", TraceLevel::Verbose, 0, |site| {
            let remote = required::<E>("FsExtractCustomIcon", "remote name", remote_name)?;
            let flags = IconFlags(extract_flags);
            site.arg(&remote).arg(flags);
            let Some(out) = the_icon.as_mut() else {
                return Err(BridgeError::missing_argument("FsExtractCustomIcon", "icon pointer"));
            };
            let mut outcome = rt.plugin().extract_icon(&remote, flags)?;
            if outcome == IconOutcome::Delayed && flags.background() {
                outcome = IconOutcome::UseDefault;
            }
            if let Some(icon) = outcome.icon() {
                *out = icon.0;
            }
            if let Some(name) = outcome.name() {
                write_fixed_raw::<E>(remote_name, MAX_PATH, Some(name));
            }
            Ok(Outcome::with_detail(outcome.code(), format!("{outcome:?}")))
        })
}

/// `FsGetPreviewBitmap`/`FsGetPreviewBitmapW`.
///
/// # Safety
///
/// `remote_name` must be terminated and hold `MAX_PATH` units; a non-null
/// `bitmap` must be writable.
pub unsafe fn get_preview_bitmap<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_name: *mut E::Unit,
    width: i32,
    height: i32,
    bitmap: *mut isize,
) -> i32 {
    rt.funnel()
        .run("FsGetPreviewBitmap", TraceLevel::Verbose, 0, |site| {
            let remote = required::<E>("FsGetPreviewBitmap", "remote name", remote_name)?;
            site.arg(&remote).arg(format!("{width}x{height}"));
            let Some(out) = bitmap.as_mut() else {
                return Err(BridgeError::missing_argument("FsGetPreviewBitmap", "bitmap pointer"));
            };
            let outcome = rt.plugin().preview_bitmap(&remote, width, height)?;
            if let Some(handle) = outcome.bitmap() {
                *out = handle.0;
            }
            if let Some(name) = outcome.name() {
                write_fixed_raw::<E>(remote_name, MAX_PATH, Some(name));
            }
            Ok(Outcome::with_detail(outcome.code(), format!("{outcome:?}")))
        })
}

/// `FsStatusInfo`/`FsStatusInfoW`.
///
/// # Safety
///
/// A non-null `remote_dir` must be terminated.
pub unsafe fn status_info<P: FsPlugin, E: HostEncoding>(
    rt: &FsRuntime<P>,
    remote_dir: *const E::Unit,
    start_end: i32,
    operation: i32,
) {
    rt.funnel()
        .run("FsStatusInfo", TraceLevel::Verbose, (), |site| {
            let remote_dir = read_str::<E>(remote_dir).unwrap_or_default();
            site.arg(&remote_dir);
            let phase = StatusPhase::from_code(start_end)
                .ok_or_else(|| BridgeError::invalid_code("FsStatusInfo", "phase", start_end))?;
            let operation = StatusOperation::from_code(operation)
                .ok_or_else(|| BridgeError::invalid_code("FsStatusInfo", "operation", operation))?;
            site.arg(phase).arg(operation);
            rt.plugin().status_info(&remote_dir, phase, operation)?;
            Ok(Outcome::new(()))
        });
}

/// `FsSetCryptCallback`/`FsSetCryptCallbackW`.
pub fn set_crypt_callback<P: FsPlugin>(
    rt: &FsRuntime<P>,
    name: &'static str,
    proc: Option<FsCryptProc>,
    crypto_number: i32,
    flags: i32,
) {
    rt.funnel().run(name, TraceLevel::Warning, (), |site| {
        site.arg(crypto_number).arg(flags);
        let proc = proc.ok_or_else(|| BridgeError::missing_argument(name, "callback pointer"))?;
        let options = CryptOptions {
            crypto_number,
            flags,
        };
        rt.callbacks().register_crypt(proc, options);
        Ok(Outcome::with_detail((), proc.encoding().to_string()))
    });
}

/// `FsGetBackgroundFlags`.
pub fn get_background_flags<P: FsPlugin>(rt: &FsRuntime<P>) -> i32 {
    rt.funnel()
        .run("FsGetBackgroundFlags", TraceLevel::Info, 0, |_| {
            let flags = rt.plugin().background_flags();
            Ok(Outcome::with_detail(fs_background_flags(&flags), format!("{flags:?}")))
        })
}

/// `FsSetDefaultParams`.
///
/// # Safety
///
/// A non-null `params` must point to a struct of at least its declared size.
pub unsafe fn set_default_params<P: FsPlugin>(
    rt: &FsRuntime<P>,
    params: *const DefaultParamStruct,
) {
    rt.funnel()
        .run("FsSetDefaultParams", TraceLevel::Info, (), |site| {
            let params = DefaultParams::read(params)?;
            site.arg(params.default_ini.display());
            rt.plugin().set_default_params(&params)?;
            Ok(Outcome::new(()))
        });
}

/// `FsGetDefRootName`. Only a narrow form exists.
///
/// # Safety
///
/// A non-null `name` must be writable for `max_len` bytes.
pub unsafe fn get_def_root_name<P: FsPlugin>(rt: &FsRuntime<P>, name: *mut u8, max_len: i32) {
    rt.funnel()
        .run("FsGetDefRootName", TraceLevel::Info, (), |site| {
            site.arg(max_len);
            let capacity = usize::try_from(max_len)
                .ok()
                .filter(|len| *len > 0 && !name.is_null())
                .ok_or_else(|| BridgeError::missing_argument("FsGetDefRootName", "name buffer"))?;
            let fallback = || rt.config().plugin_name.clone();
            let root = rt.plugin().root_name().unwrap_or_else(fallback);
            write_fixed_raw::<Narrow>(name, capacity, Some(&root));
            Ok(Outcome::with_detail((), root))
        });
}

#[cfg(test)]
mod tests {
    use tcb_core::time::FileTime;

    use super::*;

    #[test]
    fn remote_info_joins_size_and_reads_time() {
        let raw = RemoteInfoStruct {
            size_low: 5,
            size_high: 1,
            last_write_time: FileTime::ABSENT,
            attr: 0x20,
        };
        let info = unsafe { remote_info(&raw) }.expect("non-null");
        assert_eq!(info.size, 0x1_0000_0005);
        assert_eq!(info.modified, None);
        assert_eq!(info.attributes, 0x20);
        assert_eq!(unsafe { remote_info(std::ptr::null()) }, None);
    }

    #[test]
    fn invalid_answer_carries_last_error() {
        let answer = FindFirstAnswer::invalid(Some(ERROR_NO_MORE_FILES));
        assert!(!answer.is_valid());
        assert_eq!(answer.handle, -1);
    }
}
