//! The capability trait a file-system plugin implements.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tcb_core::config::{BridgeConfig, DefaultParams};
use tcb_core::errors::BridgeError;

use crate::callbacks::FsCallbacks;
use crate::outcome::{BitmapOutcome, ExecOutcome, FileTransfer, IconOutcome};
use crate::status::{CopyFlags, FsBackgroundFlag, FsStatus, IconFlags, StatusOperation, StatusPhase};

/// What a plugin receives when the runtime starts.
#[derive(Debug, Clone)]
pub struct PluginContext {
    pub config: BridgeConfig,
    /// Host callbacks; `FsInit` fills them in later, so look them up per call.
    pub callbacks: Arc<FsCallbacks>,
}

/// One directory entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindEntry {
    pub name: String,
    /// 8.3 name, rarely needed.
    pub alternate_name: Option<String>,
    pub attributes: u32,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Unix permission bits, shown by the host when present.
    pub unix_mode: Option<u32>,
}

impl FindEntry {
    pub const DIRECTORY: u32 = 0x10;

    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            ..Self::default()
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Self::DIRECTORY,
            ..Self::default()
        }
    }

    pub fn modified_at(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & Self::DIRECTORY != 0
    }
}

/// Answer to `FsFindFirst`.
#[derive(Debug)]
pub enum FindFirst<L> {
    /// The first entry and the cursor that yields the rest.
    Found(FindEntry, L),
    /// The directory exists but has no entries.
    Empty,
    /// The directory cannot be listed.
    NotFound,
}

impl<L> FindFirst<L> {
    pub fn found(first: FindEntry, listing: L) -> Self {
        FindFirst::Found(first, listing)
    }

    pub fn empty() -> Self {
        FindFirst::Empty
    }

    pub fn not_found() -> Self {
        FindFirst::NotFound
    }
}

/// Remote file details delivered with downloads and renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileInfo {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub attributes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFileRequest {
    pub remote_name: String,
    pub local_name: PathBuf,
    pub flags: CopyFlags,
    pub info: Option<RemoteFileInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutFileRequest {
    pub local_name: PathBuf,
    pub remote_name: String,
    pub flags: CopyFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenMovRequest {
    pub old_name: String,
    pub new_name: String,
    /// Move instead of copy.
    pub move_file: bool,
    pub overwrite: bool,
    pub info: Option<RemoteFileInfo>,
}

/// Verb of `FsExecuteFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecVerb {
    Open,
    Properties,
    /// `chmod` followed by the new mode, e.g. `0644`.
    Chmod(String),
    /// `quote` followed by a command line for the plugin.
    Quote(String),
    Other(String),
}

impl ExecVerb {
    pub fn parse(verb: &str) -> Self {
        if verb.eq_ignore_ascii_case("open") {
            return ExecVerb::Open;
        }
        if verb.eq_ignore_ascii_case("properties") {
            return ExecVerb::Properties;
        }
        let (head, rest) = verb.split_once(' ').unwrap_or((verb, ""));
        if head.eq_ignore_ascii_case("chmod") {
            ExecVerb::Chmod(rest.trim().to_string())
        } else if head.eq_ignore_ascii_case("quote") {
            ExecVerb::Quote(rest.trim().to_string())
        } else {
            ExecVerb::Other(verb.to_string())
        }
    }
}

impl fmt::Display for ExecVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecVerb::Open => f.write_str("open"),
            ExecVerb::Properties => f.write_str("properties"),
            ExecVerb::Chmod(mode) => write!(f, "chmod {mode}"),
            ExecVerb::Quote(command) => write!(f, "quote {command}"),
            ExecVerb::Other(verb) => f.write_str(verb),
        }
    }
}

/// Parent window handle handed to dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentWindow(pub isize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub parent: ParentWindow,
    pub remote_name: String,
    pub verb: ExecVerb,
}

/// File-system plugin driven through the `Fs*` exports.
///
/// Every method runs inside the fault funnel, so returning `Err` or panicking
/// is reported and replaced by the export's failure value. Listings are
/// locked for the duration of a call.
pub trait FsPlugin: Send + Sync + Sized + 'static {
    /// Directory cursor stored behind an `FsFindFirst` handle.
    type Listing: Send + 'static;

    fn create(context: PluginContext) -> Result<Self, BridgeError>;

    /// Runs once the host delivered its callbacks through `FsInit`.
    fn init(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn find_first(&self, path: &str) -> Result<FindFirst<Self::Listing>, BridgeError>;

    /// `None` ends the listing.
    fn find_next(&self, listing: &mut Self::Listing) -> Result<Option<FindEntry>, BridgeError>;

    fn find_close(&self, _listing: &mut Self::Listing) -> Result<(), BridgeError> {
        Ok(())
    }

    fn get_file(&self, _request: GetFileRequest) -> Result<FileTransfer, BridgeError> {
        Ok(FileTransfer::failed(FsStatus::NotSupported))
    }

    fn put_file(&self, _request: PutFileRequest) -> Result<FileTransfer, BridgeError> {
        Ok(FileTransfer::failed(FsStatus::NotSupported))
    }

    fn rename_move(&self, _request: RenMovRequest) -> Result<FsStatus, BridgeError> {
        Ok(FsStatus::NotSupported)
    }

    fn delete_file(&self, _remote_name: &str) -> Result<bool, BridgeError> {
        Ok(false)
    }

    fn make_dir(&self, _path: &str) -> Result<bool, BridgeError> {
        Ok(false)
    }

    fn remove_dir(&self, _remote_name: &str) -> Result<bool, BridgeError> {
        Ok(false)
    }

    fn execute(&self, _request: ExecRequest) -> Result<ExecOutcome, BridgeError> {
        Ok(ExecOutcome::yourself())
    }

    fn extract_icon(
        &self,
        _remote_name: &str,
        _flags: IconFlags,
    ) -> Result<IconOutcome, BridgeError> {
        Ok(IconOutcome::use_default())
    }

    fn preview_bitmap(
        &self,
        _remote_name: &str,
        _width: i32,
        _height: i32,
    ) -> Result<BitmapOutcome, BridgeError> {
        Ok(BitmapOutcome::none())
    }

    fn status_info(
        &self,
        _remote_dir: &str,
        _phase: StatusPhase,
        _operation: StatusOperation,
    ) -> Result<(), BridgeError> {
        Ok(())
    }

    fn background_flags(&self) -> Vec<FsBackgroundFlag> {
        Vec::new()
    }

    fn set_default_params(&self, _params: &DefaultParams) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Name of the plugin root in the network neighbourhood. `None` falls back
    /// to the configured plugin name.
    fn root_name(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_parse_case_insensitively() {
        assert_eq!(ExecVerb::parse("open"), ExecVerb::Open);
        assert_eq!(ExecVerb::parse("Properties"), ExecVerb::Properties);
        assert_eq!(
            ExecVerb::parse("chmod 0755"),
            ExecVerb::Chmod("0755".into())
        );
        let quote = ExecVerb::parse("quote SITE HELP");
        assert_eq!(quote, ExecVerb::Quote("SITE HELP".into()));
        assert_eq!(quote.to_string(), "quote SITE HELP");
        assert_eq!(ExecVerb::parse("edit"), ExecVerb::Other("edit".into()));
    }
}
