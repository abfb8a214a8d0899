use std::sync::Arc;

use tcb_core::errors::BridgeError;
use tcb_core::trace::{CallSite, Funnel, MemorySink, Outcome, TraceLevel, TraceSink};

fn explode(_site: &mut CallSite) -> Result<Outcome<i32>, BridgeError> {
    panic!("late fault")
}

fn funnel(threshold: TraceLevel) -> (Funnel, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let dyn_sink: Arc<dyn TraceSink> = sink.clone();
    (Funnel::new(dyn_sink, threshold), sink)
}

#[test]
fn panicking_operation_yields_failure_and_one_record() {
    let (funnel, sink) = funnel(TraceLevel::Verbose);
    let status = funnel.run("ReadHeader", TraceLevel::Verbose, 18, |site| {
        site.arg("#3");
        panic!("decoder exploded");
    });
    assert_eq!(status, 18);

    let records = sink.take();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.level, TraceLevel::Error);
    assert_eq!(record.call, "ReadHeader (#3)");
    let fault = record.fault.as_ref().expect("fault recorded");
    assert_eq!(fault.code(), "tcb.funnel.panic");
    assert_eq!(fault.info().message, "decoder exploded");
}

#[test]
fn returned_error_is_funneled_like_a_panic() {
    let (funnel, sink) = funnel(TraceLevel::Error);
    let status: i32 = funnel.run("PackFiles", TraceLevel::Info, 19, |_| {
        Err(BridgeError::plugin("demo.pack.disk_full", "no space left"))
    });
    assert_eq!(status, 19);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].fault.as_ref().map(BridgeError::code),
        Some("demo.pack.disk_full")
    );
}

#[test]
fn success_records_level_and_detail() {
    let (funnel, sink) = funnel(TraceLevel::Info);
    let status = funnel.run("CloseArchive", TraceLevel::Info, 17, |site| {
        site.arg("#1");
        Ok(Outcome::with_detail(0, "4 calls"))
    });
    assert_eq!(status, 0);
    let records = sink.take();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, TraceLevel::Info);
    assert_eq!(records[0].detail.as_deref(), Some("4 calls"));
    assert!(!records[0].is_fault());
}

#[test]
fn threshold_suppresses_quiet_records_but_never_faults() {
    let (funnel, sink) = funnel(TraceLevel::Warning);
    let quiet = |_: &mut CallSite| Ok(Outcome::new(0));
    funnel.run("ReadHeader", TraceLevel::Verbose, 18, quiet);
    funnel.run("OpenArchive", TraceLevel::Info, 0, quiet);
    assert!(sink.is_empty());

    funnel.run("ReadHeader", TraceLevel::Verbose, 18, explode);
    funnel.run("SetChangeVolProc", TraceLevel::Warning, 0, quiet);
    assert_eq!(sink.len(), 2);
}

struct ExplodingSink;

impl TraceSink for ExplodingSink {
    fn record(&self, _record: &tcb_core::TraceRecord) {
        panic!("sink failure");
    }
}

#[test]
fn a_panicking_sink_does_not_unwind_into_the_caller() {
    let funnel = Funnel::new(Arc::new(ExplodingSink), TraceLevel::Verbose);
    let seven = |_: &mut CallSite| Ok(Outcome::new(7));
    assert_eq!(funnel.run("GetPackerCaps", TraceLevel::Info, 0, seven), 7);
    assert_eq!(funnel.run("GetPackerCaps", TraceLevel::Info, 0, explode), 0);
}
