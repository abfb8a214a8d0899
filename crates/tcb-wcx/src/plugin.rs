//! The capability trait a packer plugin implements.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tcb_core::config::{BridgeConfig, DefaultParams};
use tcb_core::errors::BridgeError;

use crate::callbacks::PackerCallbacks;
use crate::status::{
    BackgroundFlag, MemPackOptions, OpenMode, PackFlags, PackerCapability, PackerStatus,
    ProcessOperation,
};

/// What a plugin receives when the runtime starts.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub config: BridgeConfig,
    /// Host callbacks; registration happens later, so look them up per call.
    pub callbacks: Arc<PackerCallbacks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub arc_name: PathBuf,
    pub mode: OpenMode,
}

/// Answer to an open request.
#[derive(Debug)]
pub enum Opened<A> {
    /// Session to store behind a new handle.
    Archive(A),
    /// The archive cannot be opened; the status goes to `OpenResult`.
    Refused(PackerStatus),
}

impl<A> Opened<A> {
    pub fn archive(archive: A) -> Self {
        Opened::Archive(archive)
    }

    pub fn refused(status: PackerStatus) -> Self {
        Opened::Refused(status)
    }
}

/// Entry metadata decoded by `ReadHeader`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveHeader {
    pub archive_name: String,
    pub file_name: String,
    pub flags: i32,
    pub pack_size: u64,
    pub unpacked_size: u64,
    pub host_os: i32,
    pub file_crc: u32,
    pub modified: Option<NaiveDateTime>,
    pub unpack_version: i32,
    pub method: i32,
    pub attributes: u32,
}

impl ArchiveHeader {
    /// Header flag: the entry is encrypted.
    pub const ENCRYPTED: i32 = 4;
    /// Attribute bit of directories.
    pub const DIRECTORY: u32 = 0x10;

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: name.into(),
            pack_size: size,
            unpacked_size: size,
            ..Self::default()
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            file_name: name.into(),
            attributes: Self::DIRECTORY,
            ..Self::default()
        }
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & Self::DIRECTORY != 0
    }
}

/// Result of advancing an archive cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHeader {
    Entry(ArchiveHeader),
    End,
    Failed(PackerStatus),
}

impl NextHeader {
    pub fn entry(header: ArchiveHeader) -> Self {
        NextHeader::Entry(header)
    }

    pub fn end() -> Self {
        NextHeader::End
    }

    pub fn failed(status: PackerStatus) -> Self {
        NextHeader::Failed(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackRequest {
    pub packed_file: PathBuf,
    /// Folder inside the archive that receives the files.
    pub sub_path: Option<String>,
    pub src_path: PathBuf,
    /// Paths relative to `src_path`; directories end with a separator.
    pub files: Vec<String>,
    pub flags: PackFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub packed_file: PathBuf,
    /// Entries to delete; `dir\*.*` selects a whole directory.
    pub files: Vec<String>,
}

/// Parent window handle handed to the configuration dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentWindow(pub isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemPackStatus {
    /// More input is welcome.
    Continue,
    /// All output was produced.
    Done,
    Failed(PackerStatus),
}

/// One `PackToMem` step: how much input was consumed and output produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemPackStep {
    pub status: MemPackStatus,
    pub taken: usize,
    pub written: usize,
}

impl MemPackStep {
    pub fn proceed(taken: usize, written: usize) -> Self {
        Self {
            status: MemPackStatus::Continue,
            taken,
            written,
        }
    }

    pub fn done(taken: usize, written: usize) -> Self {
        Self {
            status: MemPackStatus::Done,
            taken,
            written,
        }
    }

    pub fn failed(status: PackerStatus) -> Self {
        Self {
            status: MemPackStatus::Failed(status),
            taken: 0,
            written: 0,
        }
    }
}

/// Session type for plugins without in-memory packing.
#[derive(Debug)]
pub enum NoMemPack {}

/// Archive plugin driven through the packer exports.
///
/// Every method runs inside the fault funnel, so returning `Err` or panicking
/// is reported and replaced by the export's failure status. Sessions are
/// locked for the duration of a call; calls on distinct sessions may run
/// concurrently.
pub trait PackerPlugin: Send + Sync + Sized + 'static {
    /// Archive cursor stored behind an `OpenArchive` handle.
    type Archive: Send + 'static;
    /// Session stored behind a `StartMemPack` handle.
    type MemPack: Send + 'static;

    fn create(context: PluginContext) -> Result<Self, BridgeError>;

    fn capabilities(&self) -> Vec<PackerCapability>;

    fn open_archive(&self, request: OpenRequest) -> Result<Opened<Self::Archive>, BridgeError>;

    fn read_header(&self, archive: &mut Self::Archive) -> Result<NextHeader, BridgeError>;

    /// Handles the entry returned by the last `read_header`. `target` is the
    /// full destination path for extraction and `None` for skip and test.
    fn process_file(
        &self,
        archive: &mut Self::Archive,
        operation: ProcessOperation,
        target: Option<PathBuf>,
    ) -> Result<PackerStatus, BridgeError>;

    fn close_archive(&self, _archive: &mut Self::Archive) -> Result<PackerStatus, BridgeError> {
        Ok(PackerStatus::Ok)
    }

    fn pack_files(&self, _request: PackRequest) -> Result<PackerStatus, BridgeError> {
        Ok(PackerStatus::NotSupported)
    }

    fn delete_files(&self, _request: DeleteRequest) -> Result<PackerStatus, BridgeError> {
        Ok(PackerStatus::NotSupported)
    }

    fn can_handle_file(&self, _file_name: &Path) -> Result<bool, BridgeError> {
        Ok(false)
    }

    /// `None` refuses the session; the host then sees handle 0.
    fn start_mem_pack(
        &self,
        _options: MemPackOptions,
        _file_name: &str,
    ) -> Result<Option<Self::MemPack>, BridgeError> {
        Ok(None)
    }

    fn pack_to_mem(
        &self,
        _session: &mut Self::MemPack,
        _input: &[u8],
        _output: &mut [u8],
        _seek_by: i32,
    ) -> Result<MemPackStep, BridgeError> {
        Ok(MemPackStep::failed(PackerStatus::NotSupported))
    }

    fn done_mem_pack(&self, _session: &mut Self::MemPack) -> Result<PackerStatus, BridgeError> {
        Ok(PackerStatus::Ok)
    }

    fn configure(&self, _parent: ParentWindow) -> Result<(), BridgeError> {
        Ok(())
    }

    fn set_default_params(&self, _params: &DefaultParams) -> Result<(), BridgeError> {
        Ok(())
    }

    fn background_flags(&self) -> Vec<BackgroundFlag> {
        Vec::new()
    }
}
