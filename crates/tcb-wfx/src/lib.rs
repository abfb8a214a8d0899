//! File-system plugin adapter: implement [`FsPlugin`] and expand
//! [`export_fs_plugin!`] to get the native export table.

pub mod abi;
pub mod callbacks;
pub mod dispatch;
mod export;
mod find;
mod outcome;
mod plugin;
mod runtime;
mod status;

pub use tcb_core;

pub use callbacks::{FsCallbacks, FsCryptProc, LogProc, ProgressProc, RequestProc};
pub use dispatch::FindFirstAnswer;
pub use find::write_find_data;
pub use outcome::{BitmapHandle, BitmapOutcome, ExecOutcome, FileTransfer, IconHandle, IconOutcome};
pub use plugin::{
    ExecRequest, ExecVerb, FindEntry, FindFirst, FsPlugin, GetFileRequest, ParentWindow,
    PluginContext, PutFileRequest, RemoteFileInfo, RenMovRequest,
};
pub use runtime::{FsInstance, FsRuntime};
pub use status::{
    fs_background_flags, CopyFlags, FsBackgroundFlag, FsStatus, IconFlags, LogKind, RequestKind,
    StatusOperation, StatusPhase,
};
