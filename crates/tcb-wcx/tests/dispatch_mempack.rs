mod common;

use std::ptr::{null, null_mut};

use common::{runtime, DemoPacker, OpenBlock};
use tcb_core::instance::BridgeRuntime;
use tcb_core::strings::{encode_with_nul, Narrow, Wide};
use tcb_wcx::abi::{HeaderData, MEMPACK_DONE, MEMPACK_OK, PK_OM_LIST};
use tcb_wcx::dispatch;
use tcb_wcx::{PackerRuntime, PackerStatus};

fn start(rt: &PackerRuntime<DemoPacker>, name: &str) -> isize {
    let name = encode_with_nul::<Narrow>(name);
    unsafe { dispatch::start_mem_pack::<DemoPacker, Narrow>(rt, 1, name.as_ptr()) }
}

fn step(
    rt: &PackerRuntime<DemoPacker>,
    handle: isize,
    input: &[u8],
    output: &mut [u8],
) -> (i32, i32, i32) {
    let mut taken = -1;
    let mut written = -1;
    let code = unsafe {
        dispatch::pack_to_mem(
            rt,
            handle,
            input.as_ptr(),
            input.len() as i32,
            &mut taken,
            output.as_mut_ptr(),
            output.len() as i32,
            &mut written,
            0,
        )
    };
    (code, taken, written)
}

#[test]
fn streams_input_through_small_output_windows() {
    let (rt, sink) = runtime::<DemoPacker>();
    let handle = start(&rt, "stream.bin");
    assert_ne!(handle, 0);

    let input: Vec<u8> = (1..=10).collect();
    let mut window = [0u8; 4];
    assert_eq!(step(&rt, handle, &input, &mut window), (MEMPACK_OK, 10, 4));
    assert_eq!(window, [1, 2, 3, 4]);

    let mut rest = [0u8; 16];
    assert_eq!(step(&rt, handle, &[], &mut rest), (MEMPACK_DONE, 0, 6));
    assert_eq!(&rest[..6], &[5, 6, 7, 8, 9, 10]);

    assert_eq!(dispatch::done_mem_pack(&rt, handle), 0);
    assert_eq!(rt.live_sessions(), 0);

    let records = sink.take();
    assert!(records.iter().all(|record| !record.is_fault()));
    let started = format!("#{handle}");
    assert_eq!(records[0].detail.as_deref(), Some(started.as_str()));
    assert_eq!(records[1].detail.as_deref(), Some("Continue - 10, 4"));
}

#[test]
fn refused_start_returns_zero_handle() {
    let (rt, sink) = runtime::<DemoPacker>();
    let empty = encode_with_nul::<Wide>("");
    let handle = unsafe { dispatch::start_mem_pack::<DemoPacker, Wide>(&rt, 0, empty.as_ptr()) };
    assert_eq!(handle, 0);
    assert_eq!(rt.live_sessions(), 0);
    assert_eq!(sink.take()[0].detail.as_deref(), Some("ERROR"));
}

#[test]
fn unfinished_session_reports_plugin_status() {
    let (rt, _sink) = runtime::<DemoPacker>();
    let handle = start(&rt, "partial.bin");
    let mut window = [0u8; 2];
    assert_eq!(step(&rt, handle, &[7, 7, 7], &mut window).0, MEMPACK_OK);
    let first = dispatch::done_mem_pack(&rt, handle);
    assert_eq!(first, PackerStatus::ErrorWrite.code());
    let again = dispatch::done_mem_pack(&rt, handle);
    assert_eq!(again, PackerStatus::ErrorClose.code());
}

#[test]
fn archive_and_mempack_handles_do_not_mix() {
    let (rt, sink) = runtime::<DemoPacker>();
    let mem = start(&rt, "stream.bin");
    let mut block = OpenBlock::<Narrow>::new("demo.arc", PK_OM_LIST);
    let archive = unsafe { dispatch::open_archive::<DemoPacker, Narrow>(&rt, &mut block.data) };
    sink.take();

    let open_error = PackerStatus::ErrorOpen.code();
    let close_error = PackerStatus::ErrorClose.code();
    let mut slot = HeaderData::empty();
    let status = unsafe { dispatch::read_header(&rt, "ReadHeader", mem, &mut slot) };
    assert_eq!(status, open_error);
    assert_eq!(dispatch::close_archive(&rt, mem), close_error);
    let mut window = [0u8; 4];
    assert_eq!(step(&rt, archive, &[1], &mut window).0, open_error);
    assert_eq!(dispatch::done_mem_pack(&rt, archive), close_error);

    assert_eq!(rt.live_sessions(), 2);
    assert!(sink.take().iter().all(|record| !record.is_fault()));
}

#[test]
fn null_buffers_are_empty_and_counts_stay_in_bounds() {
    let (rt, _sink) = runtime::<DemoPacker>();
    let handle = start(&rt, "stream.bin");
    let code = unsafe {
        dispatch::pack_to_mem(
            &rt,
            handle,
            null(),
            64,
            null_mut(),
            null_mut(),
            -5,
            null_mut(),
            0,
        )
    };
    assert_eq!(code, MEMPACK_DONE);
    assert_eq!(dispatch::done_mem_pack(&rt, handle), 0);
}

#[test]
fn shutdown_releases_sessions_left_open() {
    let (rt, sink) = runtime::<DemoPacker>();
    let mut block = OpenBlock::<Narrow>::new("left-open.arc", PK_OM_LIST);
    let archive = unsafe { dispatch::open_archive::<DemoPacker, Narrow>(&rt, &mut block.data) };
    assert_ne!(archive, 0);
    start(&rt, "left-open.bin");
    assert_eq!(rt.live_sessions(), 2);
    sink.take();

    rt.shutdown();
    assert_eq!(rt.live_sessions(), 0);
    assert_eq!(*rt.plugin().closed.lock().expect("close counter"), 1);

    let mut records = sink.take();
    records.sort_by(|a, b| a.call.cmp(&b.call));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].call, "CloseArchive");
    assert_eq!(records[1].call, "DoneMemPack");
    for record in &records {
        assert_eq!(record.detail.as_deref(), Some("released at unload"));
    }
}
