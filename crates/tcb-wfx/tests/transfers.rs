mod common;

use std::path::PathBuf;
use std::ptr::null;

use common::{name_buffer, runtime, DemoFs};
use tcb_core::strings::{decode_str, encode_with_nul, Narrow, Wide};
use tcb_core::time::FileTime;
use tcb_wfx::abi::RemoteInfoStruct;
use tcb_wfx::{dispatch, CopyFlags, FsStatus};

#[test]
fn get_file_passes_flags_and_remote_info() {
    let (rt, sink) = runtime::<DemoFs>();
    let remote = encode_with_nul::<Narrow>("\\readme.txt");
    let mut local = name_buffer::<Narrow>("C:\\tmp\\readme.txt");
    let info = RemoteInfoStruct {
        size_low: 12,
        size_high: 0,
        last_write_time: FileTime::ABSENT,
        attr: 0x20,
    };
    let flags = CopyFlags::OVERWRITE;
    let status = unsafe {
        dispatch::get_file::<DemoFs, Narrow>(&rt, remote.as_ptr(), local.as_mut_ptr(), flags, &info)
    };
    assert_eq!(status, FsStatus::Ok.code());

    let fetched = rt.plugin().fetched.lock().expect("fetch log");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].remote_name, "\\readme.txt");
    assert_eq!(fetched[0].local_name, PathBuf::from("C:\\tmp\\readme.txt"));
    assert!(fetched[0].flags.overwrite());
    let received = fetched[0].info.as_ref().expect("remote info");
    let summary = (received.size, received.modified, received.attributes);
    assert_eq!(summary, (12, None, 0x20));

    let record = sink.take().pop().expect("record");
    assert_eq!(
        record.call,
        "FsGetFile (\\readme.txt, C:\\tmp\\readme.txt, overwrite)"
    );
    assert_eq!(record.detail.as_deref(), Some("Ok"));
}

#[test]
fn renamed_download_is_written_back_into_the_local_name() {
    let (rt, sink) = runtime::<DemoFs>();
    let remote = encode_with_nul::<Wide>("\\big.iso");
    let mut local = name_buffer::<Wide>("D:\\big.iso");
    let status = unsafe {
        dispatch::get_file::<DemoFs, Wide>(&rt, remote.as_ptr(), local.as_mut_ptr(), 0, null())
    };
    assert_eq!(status, 0);
    assert_eq!(decode_str::<Wide>(&local), "D:\\big.iso.part");
    let fetched = rt.plugin().fetched.lock().expect("fetch log");
    assert!(fetched[0].info.is_none());
    let record = sink.take().pop().expect("record");
    assert_eq!(record.detail.as_deref(), Some("Ok -> D:\\big.iso.part"));
}

#[test]
fn failed_download_leaves_the_local_name_alone() {
    let (rt, _sink) = runtime::<DemoFs>();
    let remote = encode_with_nul::<Narrow>("\\readme.txt");
    let mut local = name_buffer::<Narrow>("C:\\readme.txt");
    let status = unsafe {
        dispatch::get_file::<DemoFs, Narrow>(
            &rt,
            remote.as_ptr(),
            local.as_mut_ptr(),
            CopyFlags::EXISTS_SAME_CASE,
            null(),
        )
    };
    assert_eq!(status, FsStatus::Exists.code());

    let unknown = encode_with_nul::<Narrow>("\\photos");
    let status = unsafe {
        dispatch::get_file::<DemoFs, Narrow>(&rt, unknown.as_ptr(), local.as_mut_ptr(), 0, null())
    };
    assert_eq!(status, FsStatus::NotFound.code());
    assert_eq!(decode_str::<Narrow>(&local), "C:\\readme.txt");
}

#[test]
fn put_file_rewrites_an_adjusted_remote_name() {
    let (rt, _sink) = runtime::<DemoFs>();
    let local = encode_with_nul::<Narrow>("C:\\notes.txt");
    let mut remote = name_buffer::<Narrow>("\\notes:1.txt");
    let flags = CopyFlags::MOVE | CopyFlags::RESUME;
    let status = unsafe {
        dispatch::put_file::<DemoFs, Narrow>(&rt, local.as_ptr(), remote.as_mut_ptr(), flags)
    };
    assert_eq!(status, 0);
    assert_eq!(decode_str::<Narrow>(&remote), "\\notes_1.txt");

    let stored = rt.plugin().stored.lock().expect("store log");
    assert_eq!(stored[0].local_name, PathBuf::from("C:\\notes.txt"));
    assert_eq!(stored[0].remote_name, "\\notes:1.txt");
    assert!(stored[0].flags.move_file() && stored[0].flags.resume());
}

#[test]
fn rename_and_move_decode_their_flags() {
    let (rt, sink) = runtime::<DemoFs>();
    let old = encode_with_nul::<Wide>("\\a.txt");
    let new = encode_with_nul::<Wide>("\\b.txt");
    let info = RemoteInfoStruct {
        size_low: 1,
        size_high: 2,
        last_write_time: FileTime::ABSENT,
        attr: 0,
    };
    let moved = unsafe {
        dispatch::ren_mov_file::<DemoFs, Wide>(&rt, old.as_ptr(), new.as_ptr(), 1, 0, &info)
    };
    assert_eq!(moved, 0);
    let same = unsafe {
        dispatch::ren_mov_file::<DemoFs, Wide>(&rt, old.as_ptr(), old.as_ptr(), 0, 1, null())
    };
    assert_eq!(same, FsStatus::Exists.code());

    let requests = rt.plugin().moved.lock().expect("move log");
    assert!(requests[0].move_file && !requests[0].overwrite);
    let size = requests[0].info.as_ref().map(|info| info.size);
    assert_eq!(size, Some(0x2_0000_0001));
    assert!(!requests[1].move_file && requests[1].overwrite);

    let calls: Vec<_> = sink.take().into_iter().map(|record| record.call).collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], "FsRenMovFile (\\a.txt, \\b.txt, move)");
    assert_eq!(calls[1], "FsRenMovFile (\\a.txt, \\a.txt, overwrite)");
}

#[test]
fn delete_and_directory_operations_answer_booleans() {
    let (rt, sink) = runtime::<DemoFs>();
    let readme = encode_with_nul::<Narrow>("\\readme.txt");
    let photos = encode_with_nul::<Wide>("\\photos");
    let other = encode_with_nul::<Narrow>("\\other");
    let fresh = encode_with_nul::<Wide>("\\fresh");
    let answers = unsafe {
        [
            dispatch::delete_file::<DemoFs, Narrow>(&rt, readme.as_ptr()),
            dispatch::delete_file::<DemoFs, Narrow>(&rt, other.as_ptr()),
            dispatch::remove_dir::<DemoFs, Wide>(&rt, photos.as_ptr()),
            dispatch::remove_dir::<DemoFs, Narrow>(&rt, other.as_ptr()),
            dispatch::mk_dir::<DemoFs, Wide>(&rt, fresh.as_ptr()),
        ]
    };
    assert_eq!(answers, [1, 0, 1, 0, 1]);
    assert_eq!(*rt.plugin().created.lock().expect("mkdir log"), ["\\fresh"]);
    let details: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|record| record.detail)
        .collect();
    assert_eq!(details, ["Yes", "No", "Yes", "No", "Yes"]);
}
