//! One adapter per packer export.
//!
//! Each adapter decodes the native arguments, resolves the handle, calls the
//! plugin inside the funnel and encodes the answer. The export macro only
//! picks the encoding and forwards raw arguments here, so these functions are
//! what the tests drive.

use std::path::PathBuf;

use tcb_core::callbacks::{CryptOptions, HostProc};
use tcb_core::config::{DefaultParamStruct, DefaultParams};
use tcb_core::errors::BridgeError;
use tcb_core::handles::{lock_for_release, lock_session, shared};
use tcb_core::strings::{read_str, read_string_list, HostEncoding};
use tcb_core::trace::{Outcome, TraceLevel};

use crate::abi::{OpenArchiveData, MEMPACK_DONE, MEMPACK_OK};
use crate::callbacks::{ChangeVolProc, PackerCallbacks, PkCryptProc, ProcessDataProc};
use crate::header::HeaderSlot;
use crate::plugin::{
    DeleteRequest, MemPackStatus, NextHeader, OpenRequest, Opened, PackRequest, PackerPlugin,
    ParentWindow,
};
use crate::runtime::{PackerRuntime, PackerSession};
use crate::status::{
    background_flags, capability_flags, MemPackOptions, OpenMode, PackFlags, PackerStatus,
    ProcessOperation,
};

fn unknown_handle<R>(value: R) -> Result<Outcome<R>, BridgeError> {
    Ok(Outcome::with_detail(value, "unknown handle"))
}

/// Marks an open as failed before anything else can go wrong.
///
/// # Safety
///
/// A non-null `data` must point to a writable block.
pub unsafe fn refuse_open<U>(data: *mut OpenArchiveData<U>) {
    if let Some(data) = data.as_mut() {
        data.open_result = PackerStatus::ErrorOpen.code();
    }
}

/// `OpenArchive`/`OpenArchiveW`. Returns the new handle or 0.
///
/// # Safety
///
/// A non-null `data` must point to a writable block whose `arc_name` is a
/// terminated string.
pub unsafe fn open_archive<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    data: *mut OpenArchiveData<E::Unit>,
) -> isize {
    refuse_open(data);
    rt.funnel().run("OpenArchive", TraceLevel::Info, 0, |site| {
        let data = data
            .as_mut()
            .ok_or_else(|| BridgeError::missing_argument("OpenArchive", "archive data"))?;
        let arc_name = read_str::<E>(data.arc_name)
            .ok_or_else(|| BridgeError::missing_argument("OpenArchive", "archive name"))?;
        site.arg(&arc_name);
        let mode = OpenMode::from_code(data.open_mode)
            .ok_or_else(|| BridgeError::invalid_code("OpenArchive", "open mode", data.open_mode))?;
        site.arg(mode);

        let request = OpenRequest {
            arc_name: PathBuf::from(arc_name),
            mode,
        };
        match rt.plugin().open_archive(request)? {
            Opened::Archive(archive) => {
                let handle = rt.admit("OpenArchive", PackerSession::Archive(shared(archive)))?;
                data.open_result = PackerStatus::Ok.code();
                data.cmt_size = 0;
                data.cmt_state = 0;
                Ok(Outcome::with_detail(handle.as_isize(), handle.to_string()))
            }
            Opened::Refused(status) => {
                let status = if status.is_ok() {
                    PackerStatus::ErrorOpen
                } else {
                    status
                };
                data.open_result = status.code();
                Ok(Outcome::with_detail(0, format!("Error ({status})")))
            }
        }
    })
}

/// `ReadHeader`, `ReadHeaderEx` and `ReadHeaderExW`.
///
/// # Safety
///
/// A non-null `slot` must point to a writable header block of type `H`.
pub unsafe fn read_header<P: PackerPlugin, H: HeaderSlot>(
    rt: &PackerRuntime<P>,
    name: &'static str,
    raw: isize,
    slot: *mut H,
) -> i32 {
    rt.funnel().run(
        name,
        TraceLevel::Verbose,
        PackerStatus::ErrorRead.code(),
        |site| {
            site.arg(raw);
            let Some((handle, archive)) = rt.archive(raw) else {
                return unknown_handle(PackerStatus::ErrorOpen.code());
            };
            let slot = slot
                .as_mut()
                .ok_or_else(|| BridgeError::missing_argument(name, "header data"))?;
            let next = rt.plugin().read_header(&mut *lock_session(&archive)?)?;
            let (status, detail) = match next {
                NextHeader::Entry(header) => {
                    slot.fill(&header);
                    rt.sessions()
                        .update(handle, PackerSession::Archive(archive));
                    (PackerStatus::Ok, format!("Ok ({})", header.file_name))
                }
                NextHeader::End => (PackerStatus::EndArchive, "EndArchive".to_string()),
                NextHeader::Failed(status) => (status, status.to_string()),
            };
            Ok(Outcome::with_detail(status.code(), detail))
        },
    )
}

fn destination(dest_path: Option<String>, dest_name: Option<String>) -> Option<PathBuf> {
    let dest_path = dest_path.filter(|path| !path.is_empty());
    let dest_name = dest_name.filter(|name| !name.is_empty());
    match (dest_path, dest_name) {
        (Some(path), Some(name)) => Some(PathBuf::from(path).join(name)),
        (Some(path), None) => Some(PathBuf::from(path)),
        (None, Some(name)) => Some(PathBuf::from(name)),
        (None, None) => None,
    }
}

/// `ProcessFile`/`ProcessFileW`.
///
/// # Safety
///
/// Non-null `dest_path` and `dest_name` must be terminated strings.
pub unsafe fn process_file<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    raw: isize,
    operation: i32,
    dest_path: *const E::Unit,
    dest_name: *const E::Unit,
) -> i32 {
    let decoded = ProcessOperation::from_code(operation);
    let failure = decoded.map_or(PackerStatus::ErrorRead, ProcessOperation::failure);
    rt.funnel()
        .run("ProcessFile", TraceLevel::Verbose, failure.code(), |site| {
            site.arg(raw);
            let operation = decoded
                .ok_or_else(|| BridgeError::invalid_code("ProcessFile", "operation", operation))?;
            let target = match operation {
                ProcessOperation::Extract => {
                    destination(read_str::<E>(dest_path), read_str::<E>(dest_name))
                }
                ProcessOperation::Skip | ProcessOperation::Test => None,
            };
            site.arg(operation);
            if let Some(target) = &target {
                site.arg(target.display());
            }
            let Some((handle, archive)) = rt.archive(raw) else {
                return unknown_handle(PackerStatus::ErrorOpen.code());
            };
            if operation == ProcessOperation::Extract && target.is_none() {
                return Err(BridgeError::missing_argument("ProcessFile", "destination"));
            }
            let status = rt
                .plugin()
                .process_file(&mut *lock_session(&archive)?, operation, target)?;
            if status.is_ok() {
                rt.sessions()
                    .update(handle, PackerSession::Archive(archive));
            }
            Ok(Outcome::with_detail(status.code(), status.to_string()))
        })
}

/// `CloseArchive`. The handle is released even when the plugin faults.
pub fn close_archive<P: PackerPlugin>(rt: &PackerRuntime<P>, raw: isize) -> i32 {
    rt.funnel().run(
        "CloseArchive",
        TraceLevel::Info,
        PackerStatus::ErrorClose.code(),
        |site| {
            site.arg(raw);
            let Some((handle, _)) = rt.archive(raw) else {
                return unknown_handle(PackerStatus::ErrorClose.code());
            };
            let Some((PackerSession::Archive(archive), usage)) = rt.sessions().take(handle) else {
                return unknown_handle(PackerStatus::ErrorClose.code());
            };
            let status = rt.plugin().close_archive(&mut lock_for_release(&archive))?;
            Ok(Outcome::with_detail(status.code(), format!("{status}, {usage} calls")))
        },
    )
}

fn register<P: PackerPlugin, N: Copy, W: Copy>(
    rt: &PackerRuntime<P>,
    name: &'static str,
    raw: isize,
    proc: Option<HostProc<N, W>>,
    install: impl FnOnce(&PackerCallbacks, HostProc<N, W>),
) {
    rt.funnel().run(name, TraceLevel::Warning, (), |site| {
        site.arg(raw);
        let proc = proc.ok_or_else(|| BridgeError::missing_argument(name, "callback pointer"))?;
        install(rt.callbacks(), proc);
        Ok(Outcome::with_detail((), proc.encoding().to_string()))
    });
}

/// `SetChangeVolProc`/`SetChangeVolProcW`.
pub fn set_change_vol_proc<P: PackerPlugin>(
    rt: &PackerRuntime<P>,
    name: &'static str,
    raw: isize,
    proc: Option<ChangeVolProc>,
) {
    register(rt, name, raw, proc, PackerCallbacks::register_change_volume);
}

/// `SetProcessDataProc`/`SetProcessDataProcW`.
pub fn set_process_data_proc<P: PackerPlugin>(
    rt: &PackerRuntime<P>,
    name: &'static str,
    raw: isize,
    proc: Option<ProcessDataProc>,
) {
    register(rt, name, raw, proc, PackerCallbacks::register_process_data);
}

/// `PkSetCryptCallback`/`PkSetCryptCallbackW`.
pub fn set_crypt_callback<P: PackerPlugin>(
    rt: &PackerRuntime<P>,
    name: &'static str,
    proc: Option<PkCryptProc>,
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

/// `PackFiles`/`PackFilesW`.
///
/// # Safety
///
/// Non-null string arguments must be terminated; a non-null `add_list` must
/// be a double-terminated list.
pub unsafe fn pack_files<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    packed_file: *const E::Unit,
    sub_path: *const E::Unit,
    src_path: *const E::Unit,
    add_list: *const E::Unit,
    flags: i32,
) -> i32 {
    rt.funnel().run(
        "PackFiles",
        TraceLevel::Info,
        PackerStatus::ErrorWrite.code(),
        |site| {
            let packed_file = read_str::<E>(packed_file)
                .ok_or_else(|| BridgeError::missing_argument("PackFiles", "packed file"))?;
            let sub_path = read_str::<E>(sub_path).filter(|path| !path.is_empty());
            let src_path = read_str::<E>(src_path).unwrap_or_default();
            let files = read_string_list::<E>(add_list);
            let flags = PackFlags(flags);
            site.arg(&packed_file)
                .arg(sub_path.as_deref().unwrap_or(""))
                .arg(&src_path)
                .arg(flags)
                .arg(format!("{} files", files.len()));
            let status = rt.plugin().pack_files(PackRequest {
                packed_file: PathBuf::from(packed_file),
                sub_path,
                src_path: PathBuf::from(src_path),
                files,
                flags,
            })?;
            Ok(Outcome::with_detail(status.code(), status.to_string()))
        },
    )
}

/// `DeleteFiles`/`DeleteFilesW`.
///
/// # Safety
///
/// A non-null `packed_file` must be terminated; a non-null `delete_list` must
/// be a double-terminated list.
pub unsafe fn delete_files<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    packed_file: *const E::Unit,
    delete_list: *const E::Unit,
) -> i32 {
    rt.funnel().run(
        "DeleteFiles",
        TraceLevel::Info,
        PackerStatus::ErrorWrite.code(),
        |site| {
            let packed_file = read_str::<E>(packed_file)
                .ok_or_else(|| BridgeError::missing_argument("DeleteFiles", "packed file"))?;
            let files = read_string_list::<E>(delete_list);
            site.arg(&packed_file).arg(format!("{} files", files.len()));
            let status = rt.plugin().delete_files(DeleteRequest {
                packed_file: PathBuf::from(packed_file),
                files,
            })?;
            Ok(Outcome::with_detail(status.code(), status.to_string()))
        },
    )
}

/// `GetPackerCaps`.
pub fn get_packer_caps<P: PackerPlugin>(rt: &PackerRuntime<P>) -> i32 {
    rt.funnel().run("GetPackerCaps", TraceLevel::Info, 0, |_| {
        let caps = rt.plugin().capabilities();
        Ok(Outcome::with_detail(capability_flags(&caps), format!("{caps:?}")))
    })
}

/// `GetBackgroundFlags`.
pub fn get_background_flags<P: PackerPlugin>(rt: &PackerRuntime<P>) -> i32 {
    rt.funnel()
        .run("GetBackgroundFlags", TraceLevel::Info, 0, |_| {
            let flags = rt.plugin().background_flags();
            Ok(Outcome::with_detail(background_flags(&flags), format!("{flags:?}")))
        })
}

/// `ConfigurePacker`.
pub fn configure_packer<P: PackerPlugin>(rt: &PackerRuntime<P>, parent: isize) {
    rt.funnel()
        .run("ConfigurePacker", TraceLevel::Info, (), |_| {
            rt.plugin().configure(ParentWindow(parent))?;
            Ok(Outcome::new(()))
        });
}

/// `PackSetDefaultParams`.
///
/// # Safety
///
/// A non-null `params` must point to a struct of at least its declared size.
pub unsafe fn set_default_params<P: PackerPlugin>(
    rt: &PackerRuntime<P>,
    params: *const DefaultParamStruct,
) {
    rt.funnel()
        .run("PackSetDefaultParams", TraceLevel::Info, (), |site| {
            let params = DefaultParams::read(params)?;
            site.arg(params.default_ini.display());
            rt.plugin().set_default_params(&params)?;
            Ok(Outcome::new(()))
        });
}

/// `CanYouHandleThisFile`/`CanYouHandleThisFileW`. Returns a Win32 `BOOL`.
///
/// # Safety
///
/// A non-null `file_name` must be terminated.
pub unsafe fn can_you_handle_this_file<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    file_name: *const E::Unit,
) -> i32 {
    rt.funnel()
        .run("CanYouHandleThisFile", TraceLevel::Warning, 0, |site| {
            let file_name = read_str::<E>(file_name)
                .ok_or_else(|| BridgeError::missing_argument("CanYouHandleThisFile", "file name"))?;
            site.arg(&file_name);
            let yes = rt.plugin().can_handle_file(&PathBuf::from(file_name))?;
            Ok(Outcome::with_detail(i32::from(yes), if yes { "Yes" } else { "No" }))
        })
}

/// `StartMemPack`/`StartMemPackW`. Returns the new handle or 0.
///
/// # Safety
///
/// A non-null `file_name` must be terminated.
pub unsafe fn start_mem_pack<P: PackerPlugin, E: HostEncoding>(
    rt: &PackerRuntime<P>,
    options: i32,
    file_name: *const E::Unit,
) -> isize {
    rt.funnel()
        .run("StartMemPack", TraceLevel::Warning, 0, |site| {
            let file_name = read_str::<E>(file_name).unwrap_or_default();
            let options = MemPackOptions(options);
            site.arg(&file_name).arg(options);
            match rt.plugin().start_mem_pack(options, &file_name)? {
                Some(session) => {
                    let session = PackerSession::MemPack(shared(session));
                    let handle = rt.admit("StartMemPack", session)?;
                    Ok(Outcome::with_detail(handle.as_isize(), handle.to_string()))
                }
                None => Ok(Outcome::with_detail(0, "ERROR")),
            }
        })
}

unsafe fn host_slice<'a>(ptr: *const u8, len: i32) -> &'a [u8] {
    match usize::try_from(len) {
        Ok(len) if !ptr.is_null() && len > 0 => std::slice::from_raw_parts(ptr, len),
        _ => &[],
    }
}

unsafe fn host_slice_mut<'a>(ptr: *mut u8, len: i32) -> &'a mut [u8] {
    match usize::try_from(len) {
        Ok(len) if !ptr.is_null() && len > 0 => std::slice::from_raw_parts_mut(ptr, len),
        _ => &mut [],
    }
}

/// `PackToMem`.
///
/// # Safety
///
/// `buf_in` and `buf_out` must be valid for `in_len` and `out_len` bytes;
/// non-null `taken` and `written` must be writable.
#[allow(clippy::too_many_arguments)]
pub unsafe fn pack_to_mem<P: PackerPlugin>(
    rt: &PackerRuntime<P>,
    raw: isize,
    buf_in: *const u8,
    in_len: i32,
    taken: *mut i32,
    buf_out: *mut u8,
    out_len: i32,
    written: *mut i32,
    seek_by: i32,
) -> i32 {
    rt.funnel().run(
        "PackToMem",
        TraceLevel::Verbose,
        PackerStatus::ErrorWrite.code(),
        |site| {
            site.arg(raw).arg(in_len).arg(out_len).arg(seek_by);
            let Some((handle, session)) = rt.mem_pack(raw) else {
                return unknown_handle(PackerStatus::ErrorOpen.code());
            };
            let input = host_slice(buf_in, in_len);
            let output = host_slice_mut(buf_out, out_len);
            let step = rt
                .plugin()
                .pack_to_mem(&mut *lock_session(&session)?, input, output, seek_by)?;
            let code = match step.status {
                MemPackStatus::Continue => MEMPACK_OK,
                MemPackStatus::Done => MEMPACK_DONE,
                MemPackStatus::Failed(status) => {
                    return Ok(Outcome::with_detail(status.code(), status.to_string()));
                }
            };
            let step_taken = step.taken.min(input.len());
            let step_written = step.written.min(output.len());
            if let Some(taken) = taken.as_mut() {
                *taken = step_taken as i32;
            }
            if let Some(written) = written.as_mut() {
                *written = step_written as i32;
            }
            rt.sessions()
                .update(handle, PackerSession::MemPack(session));
            let detail = format!("{:?} - {step_taken}, {step_written}", step.status);
            Ok(Outcome::with_detail(code, detail))
        },
    )
}

/// `DoneMemPack`. The handle is released even when the plugin faults.
pub fn done_mem_pack<P: PackerPlugin>(rt: &PackerRuntime<P>, raw: isize) -> i32 {
    rt.funnel().run(
        "DoneMemPack",
        TraceLevel::Warning,
        PackerStatus::ErrorClose.code(),
        |site| {
            site.arg(raw);
            let Some((handle, _)) = rt.mem_pack(raw) else {
                return unknown_handle(PackerStatus::ErrorClose.code());
            };
            let Some((PackerSession::MemPack(session), usage)) = rt.sessions().take(handle) else {
                return unknown_handle(PackerStatus::ErrorClose.code());
            };
            let status = rt.plugin().done_mem_pack(&mut lock_for_release(&session))?;
            Ok(Outcome::with_detail(status.code(), format!("{status}, {usage} calls")))
        },
    )
}
