use std::fmt;

use serde::{Deserialize, Serialize};

/// Exit codes of the file transfer exports.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsStatus {
    Ok = 0,
    /// The target exists and resume is not supported.
    Exists = 1,
    NotFound = 2,
    ReadError = 3,
    WriteError = 4,
    UserAbort = 5,
    NotSupported = 6,
    /// The target exists and resume is supported.
    ExistsResumeAllowed = 7,
}

impl FsStatus {
    const ALL: [FsStatus; 8] = [
        FsStatus::Ok,
        FsStatus::Exists,
        FsStatus::NotFound,
        FsStatus::ReadError,
        FsStatus::WriteError,
        FsStatus::UserAbort,
        FsStatus::NotSupported,
        FsStatus::ExistsResumeAllowed,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    pub fn is_ok(self) -> bool {
        self == FsStatus::Ok
    }
}

impl fmt::Display for FsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Flags word of `FsGetFile` and `FsPutFile`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CopyFlags(pub i32);

impl CopyFlags {
    pub const OVERWRITE: i32 = 1;
    pub const RESUME: i32 = 2;
    pub const MOVE: i32 = 4;
    pub const EXISTS_SAME_CASE: i32 = 8;
    pub const EXISTS_DIFFERENT_CASE: i32 = 0x10;

    pub fn overwrite(self) -> bool {
        self.0 & Self::OVERWRITE != 0
    }

    pub fn resume(self) -> bool {
        self.0 & Self::RESUME != 0
    }

    /// The source has to be deleted after a successful copy.
    pub fn move_file(self) -> bool {
        self.0 & Self::MOVE != 0
    }

    /// Whether the host already knows the target exists, in either case.
    pub fn target_exists(self) -> bool {
        self.0 & (Self::EXISTS_SAME_CASE | Self::EXISTS_DIFFERENT_CASE) != 0
    }
}

impl fmt::Display for CopyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.overwrite(), "overwrite"),
            (self.resume(), "resume"),
            (self.move_file(), "move"),
            (self.0 & Self::EXISTS_SAME_CASE != 0, "exists"),
            (self.0 & Self::EXISTS_DIFFERENT_CASE != 0, "exists-case"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Flags word of `FsExtractCustomIcon`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IconFlags(pub i32);

impl IconFlags {
    pub const SMALL: i32 = 1;
    pub const BACKGROUND: i32 = 2;

    /// The host wants the 16x16 icon.
    pub fn small(self) -> bool {
        self.0 & Self::SMALL != 0
    }

    /// The call comes from the host's background thread.
    pub fn background(self) -> bool {
        self.0 & Self::BACKGROUND != 0
    }
}

impl fmt::Display for IconFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = if self.small() { "small" } else { "large" };
        if self.background() {
            write!(f, "{size}|background")
        } else {
            f.write_str(size)
        }
    }
}

#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsBackgroundFlag {
    Download = 1,
    Upload = 2,
    /// Background transfers need their own connection; ask the user first.
    AskUser = 4,
}

impl FsBackgroundFlag {
    pub fn flag(self) -> i32 {
        self as i32
    }
}

/// Folds background flags into the `FsGetBackgroundFlags` mask.
pub fn fs_background_flags(flags: &[FsBackgroundFlag]) -> i32 {
    flags.iter().fold(0, |mask, flag| mask | flag.flag())
}

/// Message types of the log callback.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    /// Connected to a file system that needs a disconnect. The message must
    /// start with `CONNECT` followed by a space.
    Connect = 1,
    Disconnect = 2,
    Details = 3,
    TransferComplete = 4,
    ConnectComplete = 5,
    ImportantError = 6,
    OperationComplete = 7,
}

impl LogKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Prompt types of the request callback.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Other = 0,
    UserName = 1,
    Password = 2,
    Account = 3,
    UserNameFirewall = 4,
    PasswordFirewall = 5,
    TargetDir = 6,
    Url = 7,
    MsgOk = 8,
    MsgYesNo = 9,
    MsgOkCancel = 10,
}

impl RequestKind {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Message boxes only confirm; they never return text.
    pub fn returns_text(self) -> bool {
        !matches!(
            self,
            RequestKind::MsgOk | RequestKind::MsgYesNo | RequestKind::MsgOkCancel
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPhase {
    Start,
    End,
}

impl StatusPhase {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StatusPhase::Start),
            1 => Some(StatusPhase::End),
            _ => None,
        }
    }
}

impl fmt::Display for StatusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Operations announced through `FsStatusInfo`.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusOperation {
    List = 1,
    GetSingle = 2,
    GetMulti = 3,
    PutSingle = 4,
    PutMulti = 5,
    RenMovSingle = 6,
    RenMovMulti = 7,
    Delete = 8,
    Attributes = 9,
    MkDir = 10,
    Exec = 11,
    CalcSize = 12,
    Search = 13,
    SearchText = 14,
    SyncSearch = 15,
    SyncGet = 16,
    SyncPut = 17,
    SyncDelete = 18,
    GetMultiThread = 19,
    PutMultiThread = 20,
}

impl StatusOperation {
    const ALL: [StatusOperation; 20] = [
        StatusOperation::List,
        StatusOperation::GetSingle,
        StatusOperation::GetMulti,
        StatusOperation::PutSingle,
        StatusOperation::PutMulti,
        StatusOperation::RenMovSingle,
        StatusOperation::RenMovMulti,
        StatusOperation::Delete,
        StatusOperation::Attributes,
        StatusOperation::MkDir,
        StatusOperation::Exec,
        StatusOperation::CalcSize,
        StatusOperation::Search,
        StatusOperation::SearchText,
        StatusOperation::SyncSearch,
        StatusOperation::SyncGet,
        StatusOperation::SyncPut,
        StatusOperation::SyncDelete,
        StatusOperation::GetMultiThread,
        StatusOperation::PutMultiThread,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Operations that run on a host background thread.
    pub fn is_background(self) -> bool {
        matches!(
            self,
            StatusOperation::GetMultiThread | StatusOperation::PutMultiThread
        )
    }
}

impl fmt::Display for StatusOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
