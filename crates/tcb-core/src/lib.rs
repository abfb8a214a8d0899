#![deny(missing_docs)]
#![doc = "Boundary shim shared by the packer and file-system plugin adapters: handles, \
marshaling, callbacks, the fault funnel and the instance lifecycle."]

pub mod callbacks;
pub mod config;
pub mod errors;
pub mod handles;
pub mod instance;
pub mod strings;
pub mod time;
pub mod trace;

pub use callbacks::{
    CallbackRole, CallbackSlot, CryptOptions, CryptRequest, Flow, HostProc, MAX_PATH,
};
pub use config::{BridgeConfig, DefaultParamStruct, DefaultParams, CONFIG_ENV};
pub use errors::{BridgeError, ErrorInfo};
pub use handles::{lock_for_release, lock_session, shared, Handle, HandleTable, Shared};
pub use instance::{BridgeRuntime, PluginInstance};
pub use strings::{Encoding, HostEncoding, Narrow, Wide};
pub use time::{
    decode_dos_time, decode_file_time, encode_dos_time, encode_file_time, join_u64, split_u64,
    FileTime,
};
pub use trace::{
    CallSite, Funnel, LogSink, MemorySink, Outcome, TraceLevel, TraceRecord, TraceSink, LOG_TARGET,
};
