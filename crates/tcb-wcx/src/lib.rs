//! Packer (archive) plugin adapter: implement [`PackerPlugin`] and expand
//! [`export_packer_plugin!`] to get the native export table.

pub mod abi;
pub mod callbacks;
pub mod dispatch;
mod export;
mod header;
mod plugin;
mod runtime;
mod status;

pub use tcb_core;

pub use callbacks::{
    ChangeVolProc, DataProgress, PackerCallbacks, PkCryptProc, ProcessDataProc, VolumeRequest,
};
pub use header::HeaderSlot;
pub use plugin::{
    ArchiveHeader, DeleteRequest, MemPackStatus, MemPackStep, NextHeader, NoMemPack, OpenRequest,
    Opened, PackRequest, PackerPlugin, ParentWindow, PluginContext,
};
pub use runtime::{PackerInstance, PackerRuntime, PackerSession};
pub use status::{
    background_flags, capability_flags, BackgroundFlag, MemPackOptions, OpenMode, PackFlags,
    PackerCapability, PackerStatus, ProcessOperation,
};
