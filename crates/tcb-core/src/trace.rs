//! Diagnostic records and the fault funnel around every exported call.
//!
//! [`Funnel::run`] is the only place where a plugin error or panic is turned
//! into a status code. Whatever happens inside, the host gets the operation's
//! failure value back and the sink sees exactly one record for the call.

use std::any::Any;
use std::fmt::{self, Display};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::errors::{BridgeError, ErrorInfo};

/// Log target used by [`LogSink`] and the lifecycle messages.
pub const LOG_TARGET: &str = "tcb";

/// Severity of a trace record, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    /// A fault replaced by a failure status.
    Error,
    /// Callback registration and other unusual events.
    Warning,
    /// Session open and close, archive mutation.
    Info,
    /// Per-entry iteration.
    Verbose,
}

impl TraceLevel {
    /// Whether a record at this level passes a `threshold`.
    pub fn passes(self, threshold: TraceLevel) -> bool {
        self <= threshold
    }

    /// Matching `log` level.
    pub fn log_level(self) -> log::Level {
        match self {
            TraceLevel::Error => log::Level::Error,
            TraceLevel::Warning => log::Level::Warn,
            TraceLevel::Info => log::Level::Info,
            TraceLevel::Verbose => log::Level::Debug,
        }
    }
}

impl Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceLevel::Error => "error",
            TraceLevel::Warning => "warning",
            TraceLevel::Info => "info",
            TraceLevel::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

impl FromStr for TraceLevel {
    type Err = BridgeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "error" => Ok(TraceLevel::Error),
            "warning" | "warn" => Ok(TraceLevel::Warning),
            "info" => Ok(TraceLevel::Info),
            "verbose" | "debug" => Ok(TraceLevel::Verbose),
            other => Err(BridgeError::Config(
                ErrorInfo::new(
                    "tcb.config.trace_level",
                    format!("unknown trace level '{other}'"),
                )
                .with_hint("use error, warning, info or verbose"),
            )),
        }
    }
}

/// One diagnostic record per exported call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Severity.
    pub level: TraceLevel,
    /// Operation name and salient arguments, e.g. `OpenArchive (C:\a.zip)`.
    pub call: String,
    /// Short description of the result.
    pub detail: Option<String>,
    /// Fault that replaced the result with the failure status.
    pub fault: Option<BridgeError>,
}

impl TraceRecord {
    /// Whether the record reports a fault.
    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }
}

impl Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.call)?;
        if let Some(detail) = &self.detail {
            write!(f, " => {detail}")?;
        }
        if let Some(fault) = &self.fault {
            write!(f, " !! {fault}")?;
        }
        Ok(())
    }
}

/// Destination for trace records.
pub trait TraceSink: Send + Sync {
    /// Accepts one record. Must not panic; a panic here is swallowed.
    fn record(&self, record: &TraceRecord);
}

/// Forwards records to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn record(&self, record: &TraceRecord) {
        log::log!(target: LOG_TARGET, record.level.log_level(), "{record}");
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the records seen so far.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns the records seen so far.
    pub fn take(&self) -> Vec<TraceRecord> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of records seen so far.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no record was seen.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for MemorySink {
    fn record(&self, record: &TraceRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Arc<S> {
    fn record(&self, record: &TraceRecord) {
        (**self).record(record);
    }
}

/// Call descriptor built while an operation decodes its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    name: &'static str,
    args: Vec<String>,
}

impl CallSite {
    /// Starts a descriptor for `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Appends a salient argument.
    pub fn arg(&mut self, value: impl Display) -> &mut Self {
        self.args.push(value.to_string());
        self
    }

    /// Operation name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Renders `Name (a, b)`, or just `Name` without arguments.
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.name.to_string()
        } else {
            format!("{} ({})", self.name, self.args.join(", "))
        }
    }
}

/// Successful result of an operation plus an optional trace detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<R> {
    /// Value returned to the host.
    pub value: R,
    /// Text appended to the trace record.
    pub detail: Option<String>,
}

impl<R> Outcome<R> {
    /// Result without a detail.
    pub fn new(value: R) -> Self {
        Self {
            value,
            detail: None,
        }
    }

    /// Result with a detail.
    pub fn with_detail(value: R, detail: impl Into<String>) -> Self {
        Self {
            value,
            detail: Some(detail.into()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Converts a caught panic into a bridge error.
pub fn panic_fault(operation: &str, payload: &(dyn Any + Send)) -> BridgeError {
    BridgeError::Plugin(
        ErrorInfo::new("tcb.funnel.panic", panic_message(payload))
            .with_context("operation", operation),
    )
}

/// Wraps exported operations: catches faults and writes one record per call.
#[derive(Clone)]
pub struct Funnel {
    sink: Arc<dyn TraceSink>,
    threshold: TraceLevel,
}

impl fmt::Debug for Funnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Funnel")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Funnel {
    /// Creates a funnel that writes records at or above `threshold` to `sink`.
    pub fn new(sink: Arc<dyn TraceSink>, threshold: TraceLevel) -> Self {
        Self { sink, threshold }
    }

    /// Least severe level still recorded.
    pub fn threshold(&self) -> TraceLevel {
        self.threshold
    }

    /// Runs `op` and returns its value, or `failure` when it returns an error
    /// or panics.
    pub fn run<R>(
        &self,
        name: &'static str,
        level: TraceLevel,
        failure: R,
        op: impl FnOnce(&mut CallSite) -> Result<Outcome<R>, BridgeError>,
    ) -> R {
        let mut site = CallSite::new(name);
        let result = catch_unwind(AssertUnwindSafe(|| op(&mut site)));
        let (value, record) = match result {
            Ok(Ok(outcome)) => (
                outcome.value,
                TraceRecord {
                    level,
                    call: site.describe(),
                    detail: outcome.detail,
                    fault: None,
                },
            ),
            Ok(Err(err)) => (failure, fault_record(&site, err)),
            Err(payload) => {
                let fault = panic_fault(name, payload.as_ref());
                (failure, fault_record(&site, fault))
            }
        };
        self.emit(&record);
        value
    }

    /// Writes `record` unless it is below the threshold. Faults always pass.
    pub fn emit(&self, record: &TraceRecord) {
        if !record.is_fault() && !record.level.passes(self.threshold) {
            return;
        }
        let _ = catch_unwind(AssertUnwindSafe(|| self.sink.record(record)));
    }
}

fn fault_record(site: &CallSite, fault: BridgeError) -> TraceRecord {
    TraceRecord {
        level: TraceLevel::Error,
        call: site.describe(),
        detail: None,
        fault: Some(fault),
    }
}
