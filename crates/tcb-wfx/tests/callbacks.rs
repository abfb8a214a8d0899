mod common;

use std::ptr::null;
use std::sync::Mutex;

use common::{name_buffer, runtime, DemoFs};
use tcb_core::callbacks::{CallbackRole, CryptRequest, Flow, HostProc};
use tcb_core::strings::{encode_with_nul, read_str, write_fixed_raw, Encoding, Narrow, Wide};
use tcb_core::trace::TraceLevel;
use tcb_wfx::{dispatch, FsCallbacks, FsStatus, LogKind, RequestKind};

static LOG_LINES: Mutex<Vec<(i32, i32, String)>> = Mutex::new(Vec::new());

unsafe extern "system" fn stop_progress(
    _nr: i32,
    _source: *mut u8,
    _target: *mut u8,
    _percent: i32,
) -> i32 {
    1
}

unsafe extern "system" fn record_log(nr: i32, msg_type: i32, text: *mut u16) {
    let text = read_str::<Wide>(text).unwrap_or_default();
    LOG_LINES
        .lock()
        .expect("log lines")
        .push((nr, msg_type, text));
}

unsafe extern "system" fn answer_request(
    _nr: i32,
    request_type: i32,
    _title: *mut u8,
    text: *mut u8,
    returned: *mut u8,
    max_len: i32,
) -> i32 {
    match request_type {
        2 => {
            let prompt = read_str::<Narrow>(text);
            assert_eq!(prompt.as_deref(), Some("Password for ftp.example.org"));
            assert_eq!(read_str::<Narrow>(returned).as_deref(), Some("guest"));
            write_fixed_raw::<Narrow>(returned, max_len as usize, Some("hunter2"));
            1
        }
        9 => {
            write_fixed_raw::<Narrow>(returned, max_len as usize, Some("ignored"));
            1
        }
        _ => 0,
    }
}

unsafe extern "system" fn password_store(
    nr: i32,
    crypto_nr: i32,
    mode: i32,
    connection: *mut u16,
    password: *mut u16,
    max_len: i32,
) -> i32 {
    assert_eq!((nr, crypto_nr), (4, 11));
    match (mode, read_str::<Wide>(connection).as_deref()) {
        (3, Some("ftp.example.org")) => {
            write_fixed_raw::<Wide>(password, max_len as usize, Some("s3cret"));
            0
        }
        (1, Some("ftp.example.org")) => {
            assert_eq!(read_str::<Wide>(password).as_deref(), Some("fresh"));
            0
        }
        _ => FsStatus::NotFound.code(),
    }
}

#[test]
fn fs_init_stores_callbacks_and_runs_plugin_init() {
    let (rt, sink) = runtime::<DemoFs>();
    let code = dispatch::fs_init(
        &rt,
        "FsInit",
        4,
        Some(HostProc::Narrow(stop_progress)),
        None,
        Some(HostProc::Narrow(answer_request)),
    );
    assert_eq!(code, 0);
    assert_eq!(*rt.plugin().inits.lock().expect("init counter"), 1);
    assert_eq!(rt.callbacks().plugin_nr(), 4);
    let progress = rt.callbacks().active(CallbackRole::Progress);
    assert_eq!(progress, Some(Encoding::Narrow));
    assert_eq!(rt.callbacks().active(CallbackRole::Logging), None);

    let record = sink.take().pop().expect("init record");
    assert_eq!(record.level, TraceLevel::Warning);
    assert_eq!(record.call, "FsInit (4)");
    assert_eq!(record.detail.as_deref(), Some("narrow"));
}

#[test]
fn aborting_progress_turns_into_user_abort() {
    let (rt, _sink) = runtime::<DemoFs>();
    let progress: Option<tcb_wfx::ProgressProc> = Some(HostProc::Narrow(stop_progress));
    dispatch::fs_init(&rt, "FsInit", 1, progress, None, None);
    let remote = encode_with_nul::<Narrow>("\\readme.txt");
    let mut local = name_buffer::<Narrow>("C:\\readme.txt");
    let status = unsafe {
        dispatch::get_file::<DemoFs, Narrow>(&rt, remote.as_ptr(), local.as_mut_ptr(), 0, null())
    };
    assert_eq!(status, FsStatus::UserAbort.code());
    assert_eq!(rt.callbacks().progress("a", "b", 50), Flow::Abort);
}

#[test]
fn log_lines_carry_plugin_number_and_message_type() {
    let (rt, _sink) = runtime::<DemoFs>();
    let log: Option<tcb_wfx::LogProc> = Some(HostProc::Wide(record_log));
    dispatch::fs_init(&rt, "FsInitW", 9, None, log, None);
    let path = encode_with_nul::<Wide>("\\Ärger");
    let created = unsafe { dispatch::mk_dir::<DemoFs, Wide>(&rt, path.as_ptr()) };
    assert_eq!(created, 1);
    rt.callbacks().log(LogKind::Connect, "CONNECT \\");

    let lines = LOG_LINES.lock().expect("log lines").clone();
    let message = "mkdir \\Ärger".to_string();
    assert!(lines.contains(&(9, LogKind::OperationComplete.code(), message)));
    assert!(lines.contains(&(9, 1, "CONNECT \\".to_string())));
}

#[test]
fn requests_return_text_confirmations_and_cancels() {
    let callbacks = FsCallbacks::new();
    callbacks.init(2, None, None, Some(HostProc::Narrow(answer_request)));
    let password = callbacks
        .request(
            RequestKind::Password,
            None,
            Some("Password for ftp.example.org"),
            Some("guest"),
        )
        .expect("callback registered");
    assert_eq!(password.as_deref(), Some("hunter2"));

    let confirmed = callbacks
        .request(RequestKind::MsgYesNo, Some("Delete"), Some("Really?"), None)
        .expect("callback registered");
    assert_eq!(confirmed.as_deref(), Some(""));

    let cancelled = callbacks
        .request(RequestKind::Url, None, None, None)
        .expect("callback registered");
    assert_eq!(cancelled, None);
}

#[test]
fn crypt_callback_uses_registered_numbers() {
    let (rt, sink) = runtime::<DemoFs>();
    let connection = "ftp.example.org".to_string();
    let load = CryptRequest::Load {
        name: connection.clone(),
    };
    assert_eq!(rt.callbacks().crypt(&load), Err(FsStatus::NotSupported));

    dispatch::fs_init(&rt, "FsInitW", 4, None, None, None);
    let store: Option<tcb_wfx::FsCryptProc> = Some(HostProc::Wide(password_store));
    dispatch::set_crypt_callback(&rt, "FsSetCryptCallbackW", store, 11, 1);
    let options = rt.callbacks().crypt_options().expect("options stored");
    assert!(options.master_password_set());

    let loaded = rt.callbacks().crypt(&CryptRequest::LoadNoUi {
        name: connection.clone(),
    });
    assert_eq!(loaded, Ok(Some("s3cret".to_string())));
    let saved = rt.callbacks().crypt(&CryptRequest::Save {
        name: connection,
        password: "fresh".to_string(),
    });
    assert_eq!(saved, Ok(None));
    let missing = rt.callbacks().crypt(&CryptRequest::Delete {
        name: "other".to_string(),
    });
    assert_eq!(missing, Err(FsStatus::NotFound));

    dispatch::set_crypt_callback(&rt, "FsSetCryptCallback", None, 12, 0);
    let records = sink.take();
    let fault = records
        .last()
        .and_then(|record| record.fault.as_ref())
        .expect("null pointer fault");
    assert_eq!(fault.code(), "tcb.marshal.missing_argument");
    let options = rt.callbacks().crypt_options().expect("options kept");
    assert_eq!(options.crypto_number, 11);
}
